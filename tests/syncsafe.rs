// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use id3_codec::syncsafe::{Syncsafe, decode, encode};

#[test]
fn test_roundtrip() {
    for v in [0, 1, 0x7F, 0x80, 0x3FFF, 0x4000, Syncsafe::MAX] {
        assert_eq!(decode(encode(v).unwrap()), v);
    }

    for _ in 0..10000 {
        let v = fastrand::u32(0..=Syncsafe::MAX);
        let bytes = encode(v).unwrap();
        assert!(bytes.iter().all(|b| b & 0x80 == 0));
        assert_eq!(decode(bytes), v);
    }
}

#[test]
fn test_overflow() {
    assert!(encode(Syncsafe::MAX + 1).is_err());
    assert!(encode(u32::MAX).is_err());
    for _ in 0..1000 {
        assert!(encode(fastrand::u32(Syncsafe::MAX + 1..)).is_err());
    }
}

#[test]
fn test_tag_header() {
    use id3_codec::header::TagHeader;

    let (header, raw) =
        TagHeader::read(b"ID3\x03\x00\x00\x00\x00\x08\x00rest".as_slice()).unwrap();
    assert_eq!(header.size, 1024);
    assert_eq!(header.version_major, 3);
    assert_eq!(header.total_len(), 1034);
    assert_eq!(&raw, b"ID3\x03\x00\x00\x00\x00\x08\x00");

    assert!(matches!(
        TagHeader::read(b"ID3\x03\x00".as_slice()),
        Err(id3_codec::Error::TruncatedHeader)
    ));
    assert!(matches!(
        TagHeader::read(b"TAG\x03\x00\x00\x00\x00\x08\x00".as_slice()),
        Err(id3_codec::Error::MissingId3Tag)
    ));
}
