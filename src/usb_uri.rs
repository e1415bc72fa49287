//! USB device URI parsing: `usb://[VVVV]:PPPP[/SERIAL]`.
//!
//! A pure function with no side effects — it never opens a device handle,
//! so a caller can validate a `--usb` argument before any transport exists.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbUri {
    pub vendor_id: Option<u16>,
    pub product_id: u16,
    pub serial: Option<String>,
}

const SCHEME: &str = "usb://";

pub fn parse_usb_uri(uri: &str) -> Result<UsbUri> {
    let rest = uri
        .strip_prefix(SCHEME)
        .ok_or_else(|| Error::ValidationError(format!("USB URI must start with {SCHEME}: {uri}")))?;

    let (authority, serial) = match rest.split_once('/') {
        Some((authority, serial)) => (authority, Some(serial)),
        None => (rest, None),
    };

    let (vendor_str, product_str) = authority
        .split_once(':')
        .ok_or_else(|| Error::ValidationError(format!("USB URI missing ':' separator: {uri}")))?;

    let vendor_id = if vendor_str.is_empty() {
        None
    } else {
        Some(parse_hex_u16(vendor_str, "vendor ID")?)
    };

    if product_str.is_empty() {
        return Err(Error::ValidationError(format!("USB URI is missing a product ID: {uri}")));
    }
    let product_id = parse_hex_u16(product_str, "product ID")?;

    let serial = match serial {
        None => None,
        Some(s) if s.is_empty() => None,
        Some(s) if s.chars().all(|c| c.is_ascii_alphanumeric()) => Some(s.to_string()),
        Some(s) => {
            return Err(Error::ValidationError(format!(
                "USB URI serial must be alphanumeric, got {s:?}"
            )));
        }
    };

    Ok(UsbUri {
        vendor_id,
        product_id,
        serial,
    })
}

fn parse_hex_u16(s: &str, what: &str) -> Result<u16> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    u16::from_str_radix(digits, 16).map_err(|_| Error::ValidationError(format!("invalid {what}: {s:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_and_product_given() {
        let parsed = parse_usb_uri("usb://0x04F9:0x2086").unwrap();
        assert_eq!(parsed.vendor_id, Some(0x04F9));
        assert_eq!(parsed.product_id, 0x2086);
        assert_eq!(parsed.serial, None);
    }

    #[test]
    fn vendor_omitted_with_serial() {
        let parsed = parse_usb_uri("usb://:0x2086/ABC123").unwrap();
        assert_eq!(parsed.vendor_id, None);
        assert_eq!(parsed.product_id, 0x2086);
        assert_eq!(parsed.serial, Some("ABC123".to_string()));
    }

    #[test]
    fn missing_product_id_is_an_error() {
        assert!(parse_usb_uri("usb://0x04f9:").is_err());
    }

    #[test]
    fn dash_in_serial_is_rejected() {
        assert!(parse_usb_uri("usb://:0x2086/SN-123").is_err());
    }

    #[test]
    fn missing_scheme_is_rejected() {
        assert!(parse_usb_uri("0x04F9:0x2086").is_err());
    }

    #[test]
    fn missing_colon_separator_is_rejected() {
        assert!(parse_usb_uri("usb://0x2086").is_err());
    }
}
