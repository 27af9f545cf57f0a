//! Property-based tests for CSR construction using proptest.
//!
//! Every generated request is decoded with x509-parser and compared against
//! the inputs: subject fields, SAN order and counts, and absent extensions.
mod common;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use common::*;
use proptest::prelude::*;
use tls_cert_request::{build_cert_request, KeyAlgorithm, SubjectAltNames, SubjectAttributes};

// Generators for test data
fn directory_string() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ,.()é漢-]{0,15}"
}

fn ascii_string() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 .@_-]{0,15}"
}

// 超過 OpenSSL 字串表 64 字元上限的通用名稱
fn long_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 .-]{0,80}"
}

fn optional_list(value: impl Strategy<Value = String>) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(value, 0..4)
}

fn optional_scalar(value: impl Strategy<Value = String>) -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), value]
}

fn arbitrary_subject() -> impl Strategy<Value = SubjectAttributes> {
    (
        optional_scalar(long_name()),
        optional_list(directory_string()),
        optional_list(directory_string()),
        optional_list(directory_string()),
        optional_list(directory_string()),
        optional_list(directory_string()),
        optional_list("[A-Z]{2}"),
        optional_list(ascii_string()),
        optional_scalar(ascii_string()),
    )
        .prop_map(
            |(
                common_name,
                organization,
                organizational_unit,
                street_address,
                locality,
                province,
                country,
                postal_code,
                serial_number,
            )| SubjectAttributes {
                common_name,
                organization,
                organizational_unit,
                street_address,
                locality,
                province,
                country,
                postal_code,
                serial_number,
            },
        )
}

fn arbitrary_ip() -> impl Strategy<Value = IpAddr> {
    prop_oneof![
        any::<u32>().prop_map(|ip| IpAddr::V4(Ipv4Addr::from(ip))),
        any::<u128>().prop_map(|ip| IpAddr::V6(Ipv6Addr::from(ip))),
    ]
}

/// SAN 文字，URI 含大小寫混合的主機與 `.`、`..` 路徑段，必須原樣保留。
fn arbitrary_san_text() -> impl Strategy<Value = (Vec<String>, Vec<IpAddr>, Vec<String>)> {
    (
        prop::collection::vec("[a-z][a-z0-9-]{0,10}\\.example", 0..5),
        prop::collection::vec(arbitrary_ip(), 0..5),
        prop::collection::vec(
            "(https|spiffe)://[A-Za-z][A-Za-z0-9]{0,8}(/(\\.\\.|\\.|[A-Za-z0-9]{1,6})){0,3}",
            0..5,
        ),
    )
}

fn parse_sans(dns_names: &[String], ip_addresses: &[IpAddr], uris: &[String]) -> SubjectAltNames {
    let ip_text: Vec<String> = ip_addresses.iter().map(|ip| ip.to_string()).collect();
    SubjectAltNames::parse(dns_names, &ip_text, uris).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn subject_round_trips_exactly(subject in arbitrary_subject()) {
        let key = key(KeyAlgorithm::Ed25519, ED25519_PEM);
        let csr = build_cert_request(&subject, &SubjectAltNames::new(), &key).unwrap();

        let decoded = decode_der(csr.der());
        prop_assert_eq!(&decoded.subject, &subject);
        prop_assert_eq!(&csr.subject().unwrap(), &subject);
    }

    #[test]
    fn san_lists_keep_order_and_count(
        (dns_names, ip_addresses, uris) in arbitrary_san_text()
    ) {
        let sans = parse_sans(&dns_names, &ip_addresses, &uris);
        let key = key(KeyAlgorithm::Ed25519, ED25519_PEM);
        let csr = build_cert_request(&SubjectAttributes::new(), &sans, &key).unwrap();

        let decoded = decode_der(csr.der());
        prop_assert_eq!(decoded.has_san_extension, !sans.is_empty());
        prop_assert_eq!(&decoded.dns_names, &dns_names);
        prop_assert_eq!(&decoded.ip_addresses, &ip_addresses);
        prop_assert_eq!(&decoded.uris, &uris);
    }

    #[test]
    fn san_text_parsing_matches_typed_values(
        (dns_names, ip_addresses, uris) in arbitrary_san_text()
    ) {
        let sans = parse_sans(&dns_names, &ip_addresses, &uris);
        prop_assert_eq!(&sans.ip_addresses, &ip_addresses);
        let uri_text: Vec<&str> = sans.uris.iter().map(|uri| uri.as_str()).collect();
        prop_assert_eq!(&uri_text, &uris);

        let reparsed = parse_sans(&sans.dns_names, &sans.ip_addresses, &uris);
        prop_assert_eq!(&reparsed, &sans);
    }

    #[test]
    fn output_is_single_pem_block(
        subject in arbitrary_subject(),
        (dns_names, ip_addresses, uris) in arbitrary_san_text()
    ) {
        let sans = parse_sans(&dns_names, &ip_addresses, &uris);
        let key = key(KeyAlgorithm::Ed25519, ED25519_PEM);
        let csr = build_cert_request(&subject, &sans, &key).unwrap();

        prop_assert!(csr.pem().starts_with("-----BEGIN CERTIFICATE REQUEST-----\n"));
        prop_assert_eq!(csr.pem().matches("-----BEGIN").count(), 1);
        prop_assert!(csr.verify().unwrap());
        prop_assert_eq!(decode_pem(csr.pem()).to_be_signed, decode_der(csr.der()).to_be_signed);
    }
}
