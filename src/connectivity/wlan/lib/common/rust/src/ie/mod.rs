// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

mod reader;

pub use reader::Reader;

use {
    crate::{appendable::Appendable, error::FrameWriteError},
    zerocopy::{AsBytes, ByteSlice, FromBytes, Unaligned},
};

// IEEE Std 802.11-2016, 9.4.2.1, Table 9-77
#[repr(C)]
#[derive(AsBytes, FromBytes, Unaligned, PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct Id(pub u8);

impl Id {
    pub const SSID: Self = Self(0);
    pub const SUPPORTED_RATES: Self = Self(1);
    pub const DSSS_PARAM_SET: Self = Self(3);
    pub const TIM: Self = Self(5);
    pub const COUNTRY: Self = Self(7);
    pub const HT_CAPABILITIES: Self = Self(45);
    pub const RSNE: Self = Self(48);
    pub const EXT_SUPPORTED_RATES: Self = Self(50);
    pub const HT_OPERATION: Self = Self(61);
    pub const VENDOR_SPECIFIC: Self = Self(221);
}

#[repr(C, packed)]
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, Debug)]
pub struct Header {
    pub id: Id,
    pub body_len: u8,
}

pub const IE_MAX_LEN: usize = 255;
pub const SSID_MAX_LEN: usize = 32;
pub const SUPPORTED_RATES_MAX_LEN: usize = 8;

/// Highest bit of a rate octet marks the rate as part of the BSS basic rate set.
pub const BASIC_RATE_BIT: u8 = 0x80;

fn write_ie<B: Appendable>(buf: &mut B, id: Id, body: &[u8]) -> Result<(), FrameWriteError> {
    if body.len() > IE_MAX_LEN {
        return Err(FrameWriteError::new_invalid_data(format!(
            "element {} body of {} bytes exceeds maximum",
            id.0,
            body.len()
        )));
    }
    if !buf.can_append(2 + body.len()) {
        return Err(FrameWriteError::BufferTooSmall);
    }
    buf.append_value(&Header { id, body_len: body.len() as u8 })?;
    buf.append_bytes(body)?;
    Ok(())
}

pub fn write_ssid<B: Appendable>(buf: &mut B, ssid: &[u8]) -> Result<(), FrameWriteError> {
    if ssid.len() > SSID_MAX_LEN {
        return Err(FrameWriteError::new_invalid_data(format!(
            "SSID of {} bytes is too long",
            ssid.len()
        )));
    }
    write_ie(buf, Id::SSID, ssid)
}

pub fn write_supported_rates<B: Appendable>(
    buf: &mut B,
    rates: &[u8],
) -> Result<(), FrameWriteError> {
    if rates.is_empty() {
        return Err(FrameWriteError::new_invalid_data("no rates to write"));
    }
    if rates.len() > SUPPORTED_RATES_MAX_LEN {
        return Err(FrameWriteError::new_invalid_data("too many rates for SupportedRates"));
    }
    write_ie(buf, Id::SUPPORTED_RATES, rates)
}

pub fn write_ext_supported_rates<B: Appendable>(
    buf: &mut B,
    rates: &[u8],
) -> Result<(), FrameWriteError> {
    if rates.is_empty() {
        return Err(FrameWriteError::new_invalid_data("no rates to write"));
    }
    write_ie(buf, Id::EXT_SUPPORTED_RATES, rates)
}

/// Writes up to eight rates into a SupportedRates element and spills the remainder into an
/// ExtendedSupportedRates element.
pub fn write_rates<B: Appendable>(buf: &mut B, rates: &[u8]) -> Result<(), FrameWriteError> {
    if rates.len() > SUPPORTED_RATES_MAX_LEN + IE_MAX_LEN {
        return Err(FrameWriteError::new_invalid_data("rates will not fit in elements"));
    }
    let split = std::cmp::min(rates.len(), SUPPORTED_RATES_MAX_LEN);
    write_supported_rates(buf, &rates[..split])?;
    if rates.len() > split {
        write_ext_supported_rates(buf, &rates[split..])?;
    }
    Ok(())
}

pub fn write_dsss_param_set<B: Appendable>(
    buf: &mut B,
    channel: u8,
) -> Result<(), FrameWriteError> {
    write_ie(buf, Id::DSSS_PARAM_SET, &[channel])
}

/// The subset of a beacon's or probe response's elements the station keeps about a BSS.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BssElements {
    pub ssid: Option<Vec<u8>>,
    pub rates: Vec<u8>,
    pub dsss_channel: Option<u8>,
}

impl BssElements {
    /// Collects the elements the station cares about. Malformed elements of a known id are
    /// ignored rather than failing the whole frame; truncated trailing elements end the walk.
    pub fn parse<B: ByteSlice>(elements: B) -> Self {
        let mut parsed = BssElements::default();
        for (id, body) in Reader::new(elements) {
            match id {
                Id::SSID if body.len() <= SSID_MAX_LEN => parsed.ssid = Some(body.to_vec()),
                Id::SUPPORTED_RATES | Id::EXT_SUPPORTED_RATES => {
                    parsed.rates.extend_from_slice(&body[..])
                }
                Id::DSSS_PARAM_SET if body.len() == 1 => parsed.dsss_channel = Some(body[0]),
                _ => (),
            }
        }
        parsed
    }

    pub fn basic_rates(&self) -> Vec<u8> {
        self.rates.iter().filter(|r| *r & BASIC_RATE_BIT != 0).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::buffer_writer::BufferWriter};

    #[test]
    fn ssid_element() {
        let mut buf = vec![];
        write_ssid(&mut buf, b"foo").expect("valid ssid");
        assert_eq!(&buf[..], &[0, 3, b'f', b'o', b'o']);

        let mut buf = vec![];
        write_ssid(&mut buf, &[]).expect("wildcard ssid");
        assert_eq!(&buf[..], &[0, 0]);

        assert!(write_ssid(&mut vec![], &[b'x'; 33][..]).is_err());
    }

    #[test]
    fn rates_fit_in_supp_rates() {
        let rates: Vec<u8> = (0..SUPPORTED_RATES_MAX_LEN as u8).collect();
        let mut buf = vec![];
        write_rates(&mut buf, &rates[..]).expect("valid rates");
        assert_eq!(&buf[..], &[1, 8, 0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn rates_span_two_elements() {
        let rates: Vec<u8> = (0..10).collect();
        let mut buf = vec![];
        write_rates(&mut buf, &rates[..]).expect("valid rates");
        #[rustfmt::skip]
        assert_eq!(&buf[..], &[
            1, 8, 0, 1, 2, 3, 4, 5, 6, 7, // SupportedRates
            50, 2, 8, 9, // ExtendedSupportedRates
        ]);
    }

    #[test]
    fn rates_rejected() {
        assert!(write_rates(&mut vec![], &[]).is_err());
        let too_many = [42u8; 1 + SUPPORTED_RATES_MAX_LEN + IE_MAX_LEN];
        assert!(write_rates(&mut vec![], &too_many[..]).is_err());
        assert!(write_supported_rates(&mut vec![], &[1u8; 9][..]).is_err());
    }

    #[test]
    fn element_does_not_fit_buffer() {
        let mut bytes = [0u8; 3];
        let mut w = BufferWriter::new(&mut bytes[..]);
        assert_eq!(write_ssid(&mut w, b"foo"), Err(FrameWriteError::BufferTooSmall));
        assert_eq!(w.bytes_written(), 0);
    }

    #[test]
    fn bss_elements() {
        #[rustfmt::skip]
        let bytes = [
            0, 3, b'f', b'o', b'o', // SSID
            1, 2, 0x82, 0x04, // SupportedRates
            3, 1, 6, // DSSS Parameter Set
            50, 1, 0x8c, // ExtendedSupportedRates
            221, 2, 0, 0, // Vendor specific
            3, 2, 1, 1, // malformed DSSS Parameter Set
        ];
        let parsed = BssElements::parse(&bytes[..]);
        assert_eq!(parsed.ssid, Some(b"foo".to_vec()));
        assert_eq!(parsed.rates, vec![0x82, 0x04, 0x8c]);
        assert_eq!(parsed.basic_rates(), vec![0x82, 0x8c]);
        assert_eq!(parsed.dsss_channel, Some(6));
    }
}
