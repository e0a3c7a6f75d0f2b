//! Parsed X.509 certificate value.

use std::fmt;

use sha2::{Digest, Sha256};

/// A DER-encoded X.509 certificate that has been checked to parse.
///
/// Equality and hashing are over the exact encoded bytes, so two
/// certificates with the same serial or subject but different encodings
/// are distinct.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Certificate {
    der: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid DER certificate: {0}")]
pub struct InvalidCertificate(String);

impl Certificate {
    /// Validate `der` as a single X.509 certificate with no trailing bytes.
    pub fn from_der(der: Vec<u8>) -> Result<Self, InvalidCertificate> {
        match x509_parser::parse_x509_certificate(&der) {
            Ok((rest, _)) if rest.is_empty() => {}
            Ok((rest, _)) => {
                return Err(InvalidCertificate(format!(
                    "{} trailing bytes after certificate",
                    rest.len()
                )))
            }
            Err(e) => return Err(InvalidCertificate(e.to_string())),
        }
        Ok(Self { der })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn into_der(self) -> Vec<u8> {
        self.der
    }

    /// PEM encoding with a `CERTIFICATE` label.
    pub fn to_pem(&self) -> String {
        pem::encode(&pem::Pem::new("CERTIFICATE", self.der.clone()))
    }

    /// Lowercase hex SHA-256 over the DER bytes.
    pub fn fingerprint(&self) -> String {
        let hash = Sha256::digest(&self.der);
        let mut s = String::with_capacity(hash.len() * 2);
        for b in hash.iter() {
            s.push_str(&format!("{b:02x}"));
        }
        s
    }

    /// Subject distinguished name in RFC 4514 form, best effort.
    pub fn subject(&self) -> String {
        x509_parser::parse_x509_certificate(&self.der)
            .map(|(_, cert)| cert.subject().to_string())
            .unwrap_or_default()
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn self_signed(cn: &str) -> Vec<u8> {
        let key = rcgen::KeyPair::generate().unwrap();
        let mut params = rcgen::CertificateParams::new(Vec::<String>::new()).unwrap();
        params
            .distinguished_name
            .push(rcgen::DnType::CommonName, cn);
        params.self_signed(&key).unwrap().der().to_vec()
    }

    #[test]
    fn accepts_valid_der() {
        let cert = Certificate::from_der(self_signed("root-a")).unwrap();
        assert!(cert.subject().contains("root-a"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(Certificate::from_der(vec![0x30, 0x03, 0x02, 0x01, 0x00]).is_err());
        assert!(Certificate::from_der(Vec::new()).is_err());
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut der = self_signed("root-b");
        der.extend_from_slice(&[0, 0, 0]);
        let err = Certificate::from_der(der).unwrap_err();
        assert!(err.to_string().contains("trailing"));
    }

    #[test]
    fn fingerprint_is_hex_sha256() {
        let cert = Certificate::from_der(self_signed("root-c")).unwrap();
        let fp = cert.fingerprint();
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp, cert.clone().fingerprint());
    }

    #[test]
    fn pem_encoding_carries_certificate_label() {
        let der = self_signed("root-d");
        let cert = Certificate::from_der(der.clone()).unwrap();
        let parsed = pem::parse(cert.to_pem()).unwrap();
        assert_eq!(parsed.tag(), "CERTIFICATE");
        assert_eq!(parsed.contents(), der.as_slice());
    }
}
