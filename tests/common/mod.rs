#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tls_cert_request::{KeyAlgorithm, PrivateKey, SubjectAttributes};
use x509_parser::{pem::parse_x509_pem, prelude::*};

pub const RSA_PEM: &str = include_str!("../fixtures/rsa_2048.pem");
pub const EC_P256_PEM: &str = include_str!("../fixtures/ec_p256.pem");
pub const EC_P384_PEM: &str = include_str!("../fixtures/ec_p384.pem");
pub const EC_P224_PEM: &str = include_str!("../fixtures/ec_p224.pem");
pub const ED25519_PEM: &str = include_str!("../fixtures/ed25519.pem");

pub const CSR_PREAMBLE: &str = "-----BEGIN CERTIFICATE REQUEST-----";

pub fn key(algorithm: KeyAlgorithm, pem: &str) -> PrivateKey {
    PrivateKey::from_pem(algorithm, pem.as_bytes()).expect("failed to parse fixture key")
}

/// 以 x509-parser 解碼後的 CSR 內容，只保留測試需要比對的欄位。
#[derive(Debug, Default)]
pub struct DecodedRequest {
    pub subject: SubjectAttributes,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
    pub uris: Vec<String>,
    pub has_san_extension: bool,
    /// CertificationRequestInfo 的原始 DER，也就是被簽署的位元組。
    pub to_be_signed: Vec<u8>,
}

pub fn decode_pem(pem: &str) -> DecodedRequest {
    let (_, block) = parse_x509_pem(pem.as_bytes()).expect("PEM block");
    assert_eq!(block.label, "CERTIFICATE REQUEST");
    decode_der(&block.contents)
}

pub fn decode_der(der: &[u8]) -> DecodedRequest {
    let (rest, csr) = X509CertificationRequest::from_der(der).expect("PKCS#10 structure");
    assert!(rest.is_empty(), "trailing bytes after CSR");

    let info = &csr.certification_request_info;
    let mut decoded = DecodedRequest {
        to_be_signed: info.raw.to_vec(),
        ..Default::default()
    };

    for attr in info.subject.iter_attributes() {
        let value = attr.as_str().expect("string attribute").to_owned();
        let subject = &mut decoded.subject;
        match attr.attr_type().to_id_string().as_str() {
            "2.5.4.3" => subject.common_name = value,
            "2.5.4.5" => subject.serial_number = value,
            "2.5.4.6" => subject.country.push(value),
            "2.5.4.7" => subject.locality.push(value),
            "2.5.4.8" => subject.province.push(value),
            "2.5.4.9" => subject.street_address.push(value),
            "2.5.4.10" => subject.organization.push(value),
            "2.5.4.11" => subject.organizational_unit.push(value),
            "2.5.4.17" => subject.postal_code.push(value),
            other => panic!("unexpected subject attribute {}", other),
        }
    }

    if let Some(extensions) = csr.requested_extensions() {
        for ext in extensions {
            if let ParsedExtension::SubjectAlternativeName(san) = ext {
                decoded.has_san_extension = true;
                for name in &san.general_names {
                    match name {
                        GeneralName::DNSName(dns) => decoded.dns_names.push(dns.to_string()),
                        GeneralName::IPAddress(bytes) => {
                            decoded.ip_addresses.push(ip_from_bytes(bytes))
                        }
                        GeneralName::URI(uri) => decoded.uris.push(uri.to_string()),
                        other => panic!("unexpected general name {:?}", other),
                    }
                }
            }
        }
    }

    decoded
}

fn ip_from_bytes(bytes: &[u8]) -> IpAddr {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().unwrap();
            IpAddr::V4(Ipv4Addr::from(octets))
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().unwrap();
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        n => panic!("invalid IP address length {}", n),
    }
}
