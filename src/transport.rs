//! Transport interface (C8): the byte-sink the job controller writes to.
//!
//! Two concrete implementations, USB bulk and raw TCP, retry with backoff up
//! to [`MAX_WRITE_ATTEMPTS`] times (doubling backoff starting at
//! [`INITIAL_BACKOFF`]) before surfacing a write failure. TCP's `write_all`
//! is all-or-nothing per call, so it retries only on a transient `Timeout`
//! via [`with_retry`]; every other failure (broken pipe, connection reset)
//! is fatal and surfaces immediately. USB bulk writes can legitimately come
//! back short of the full buffer, so [`UsbTransport::write_all`] retries the
//! *remaining* bytes across attempts (a `Timeout` on a chunk is treated the
//! same as a short write — try again), only surfacing `TransportWrite` once
//! the buffer isn't fully flushed after [`MAX_WRITE_ATTEMPTS`] attempts.

use crate::error::{Error, Result};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

const MAX_WRITE_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const TCP_PORT: u16 = 9100;
const TCP_TIMEOUT: Duration = Duration::from_secs(5);
const USB_TIMEOUT: Duration = Duration::from_secs(10);
const USB_PRINTER_CLASS: u8 = 7;

pub trait Transport {
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Read a fixed-size status reply, tolerating a timeout as "no reply"
    /// rather than a hard failure (some TCP-connected units never answer a
    /// status request).
    fn read_status(&mut self) -> Result<Option<[u8; 32]>>;

    fn close(&mut self) -> Result<()>;
}

impl Transport for Box<dyn Transport> {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_all(data)
    }

    fn read_status(&mut self) -> Result<Option<[u8; 32]>> {
        (**self).read_status()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

fn with_retry<T>(mut attempt: impl FnMut() -> Result<T>) -> Result<T> {
    let mut backoff = INITIAL_BACKOFF;
    for try_number in 1..=MAX_WRITE_ATTEMPTS {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(Error::TransportTimeout(_)) if try_number < MAX_WRITE_ATTEMPTS => {
                std::thread::sleep(backoff);
                backoff *= 2;
            }
            Err(other) => return Err(other),
        }
    }
    unreachable!("loop always returns on the final attempt")
}

pub struct TcpTransport {
    stream: TcpStream,
    closed: bool,
}

impl TcpTransport {
    pub fn connect(host: &str) -> Result<Self> {
        let address = if host.contains(':') {
            host.to_string()
        } else {
            format!("{host}:{TCP_PORT}")
        };
        let stream = std::net::TcpStream::connect(&address)
            .map_err(|e| Error::TransportNetwork(e))?;
        stream.set_nodelay(true).map_err(Error::TransportNetwork)?;
        stream
            .set_read_timeout(Some(TCP_TIMEOUT))
            .map_err(Error::TransportNetwork)?;
        stream
            .set_write_timeout(Some(TCP_TIMEOUT))
            .map_err(Error::TransportNetwork)?;
        Ok(TcpTransport { stream, closed: false })
    }
}

impl Transport for TcpTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        with_retry(|| {
            self.stream.write_all(data).map_err(classify_io_error)?;
            self.stream.flush().map_err(classify_io_error)
        })
    }

    fn read_status(&mut self) -> Result<Option<[u8; 32]>> {
        let mut buf = [0u8; 32];
        match self.stream.read_exact(&mut buf) {
            Ok(()) => Ok(Some(buf)),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut || e.kind() == std::io::ErrorKind::WouldBlock => {
                Ok(None)
            }
            Err(e) => Err(classify_io_error(e)),
        }
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            let _ = self.stream.shutdown(std::net::Shutdown::Both);
            self.closed = true;
        }
        Ok(())
    }
}

fn classify_io_error(e: std::io::Error) -> Error {
    use std::io::ErrorKind::*;
    match e.kind() {
        TimedOut | WouldBlock => Error::TransportTimeout(e.to_string()),
        BrokenPipe | ConnectionReset => Error::TransportWrite(e.to_string()),
        PermissionDenied => Error::TransportPermission(e.to_string()),
        _ => Error::TransportNetwork(e),
    }
}

pub struct UsbTransport {
    handle: rusb::DeviceHandle<rusb::GlobalContext>,
    interface_number: u8,
    endpoint_in: u8,
    endpoint_out: u8,
    detached_kernel_driver: bool,
    closed: bool,
}

impl UsbTransport {
    pub fn open(vendor_id: u16, product_id: u16, serial: Option<&str>) -> Result<Self> {
        let devices = rusb::devices().map_err(classify_usb_error)?;
        let mut target = None;
        for device in devices.iter() {
            let desc = device.device_descriptor().map_err(classify_usb_error)?;
            if desc.vendor_id() != vendor_id || desc.product_id() != product_id {
                continue;
            }
            if let Some(wanted_serial) = serial {
                let handle = device.open().map_err(classify_usb_error)?;
                let matches = handle
                    .read_serial_number_string_ascii(&desc)
                    .map(|s| s == wanted_serial)
                    .unwrap_or(false);
                if !matches {
                    continue;
                }
            }
            target = Some(device);
            break;
        }

        let device = target.ok_or_else(|| {
            Error::TransportNotFound(format!("USB device {vendor_id:04X}:{product_id:04X} not found"))
        })?;
        let handle = device.open().map_err(classify_usb_error)?;

        let mut detached_kernel_driver = false;
        if handle.kernel_driver_active(0).unwrap_or(false) {
            handle.detach_kernel_driver(0).map_err(classify_usb_error)?;
            detached_kernel_driver = true;
        }

        handle.set_active_configuration(1).map_err(classify_usb_error)?;
        let config = device.config_descriptor(0).map_err(classify_usb_error)?;

        let mut interface_number = None;
        let mut endpoint_in = 0u8;
        let mut endpoint_out = 0u8;
        'interfaces: for interface in config.interfaces() {
            for descriptor in interface.descriptors() {
                if descriptor.class_code() != USB_PRINTER_CLASS {
                    continue;
                }
                for endpoint in descriptor.endpoint_descriptors() {
                    match endpoint.direction() {
                        rusb::Direction::In => endpoint_in = endpoint.address(),
                        rusb::Direction::Out => endpoint_out = endpoint.address(),
                    }
                }
                interface_number = Some(interface.number());
                break 'interfaces;
            }
        }

        let interface_number = interface_number
            .ok_or_else(|| Error::TransportNotFound("no printer-class USB interface found".to_string()))?;
        handle.claim_interface(interface_number).map_err(classify_usb_error)?;

        Ok(UsbTransport {
            handle,
            interface_number,
            endpoint_in,
            endpoint_out,
            detached_kernel_driver,
            closed: false,
        })
    }
}

impl Transport for UsbTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut offset = 0;
        let mut backoff = INITIAL_BACKOFF;
        for try_number in 1..=MAX_WRITE_ATTEMPTS {
            match self.handle.write_bulk(self.endpoint_out, &data[offset..], USB_TIMEOUT) {
                Ok(written) => {
                    offset += written;
                    if offset == data.len() {
                        return Ok(());
                    }
                }
                Err(rusb::Error::Timeout) => {}
                Err(e) => return Err(classify_usb_error(e)),
            }
            if try_number < MAX_WRITE_ATTEMPTS {
                std::thread::sleep(backoff);
                backoff *= 2;
            }
        }
        Err(Error::TransportWrite(format!(
            "short USB write: {offset} of {} bytes after {MAX_WRITE_ATTEMPTS} attempts",
            data.len()
        )))
    }

    fn read_status(&mut self) -> Result<Option<[u8; 32]>> {
        if self.endpoint_in == 0 {
            return Ok(None);
        }
        let mut buf = [0u8; 32];
        match self.handle.read_bulk(self.endpoint_in, &mut buf, USB_TIMEOUT) {
            Ok(n) if n == 32 => Ok(Some(buf)),
            Ok(_) => Ok(None),
            Err(rusb::Error::Timeout) => Ok(None),
            Err(e) => Err(classify_usb_error(e)),
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let _ = self.handle.release_interface(self.interface_number);
        if self.detached_kernel_driver {
            if let Err(e) = self.handle.attach_kernel_driver(self.interface_number) {
                log::debug!("failed to reattach kernel driver: {e}");
            }
        }
        self.closed = true;
        Ok(())
    }
}

fn classify_usb_error(e: rusb::Error) -> Error {
    match e {
        rusb::Error::Timeout => Error::TransportTimeout(e.to_string()),
        rusb::Error::Access => Error::TransportPermission(e.to_string()),
        rusb::Error::NoDevice | rusb::Error::NotFound => Error::TransportNotFound(e.to_string()),
        other => Error::TransportWrite(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_succeeds_after_transient_timeouts() {
        let mut calls = 0;
        let result: Result<()> = with_retry(|| {
            calls += 1;
            if calls < 2 {
                Err(Error::TransportTimeout("slow link".to_string()))
            } else {
                Ok(())
            }
        });
        assert!(result.is_ok());
        assert_eq!(calls, 2);
    }

    #[test]
    fn fatal_errors_are_not_retried() {
        let mut calls = 0;
        let result: Result<()> = with_retry(|| {
            calls += 1;
            Err(Error::TransportWrite("broken pipe".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn retry_gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: Result<()> = with_retry(|| {
            calls += 1;
            Err(Error::TransportTimeout("still slow".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(calls, MAX_WRITE_ATTEMPTS);
    }
}
