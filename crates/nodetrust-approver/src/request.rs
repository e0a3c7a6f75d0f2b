//! Signing requests and the identity claims extracted from them.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::error::X509Error;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::prelude::FromDer;

const CSR_LABEL: &str = "CERTIFICATE REQUEST";

/// A pending signing request as submitted by a joining member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningRequest {
    /// Diagnostic name of the request object.
    pub name: String,
    /// PEM-encoded PKCS#10 request.
    pub request: Vec<u8>,
    /// Groups of the identity that submitted the request.
    pub groups: Vec<String>,
    /// Key usages the request asks for, in wire spelling.
    pub usages: Vec<String>,
    /// Signer the request is addressed to, if declared.
    pub signer_name: Option<String>,
}

impl SigningRequest {
    pub fn new(name: impl Into<String>, request: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            request: request.into(),
            ..Self::default()
        }
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_usages<I, S>(mut self, usages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.usages = usages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_signer(mut self, signer_name: impl Into<String>) -> Self {
        self.signer_name = Some(signer_name.into());
        self
    }

    pub fn parse(&self) -> Result<ParsedRequest, ParseError> {
        ParsedRequest::from_pem(&self.request)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid PEM: {0}")]
    Pem(#[from] pem::PemError),

    #[error("unexpected PEM label {0:?}, expected \"CERTIFICATE REQUEST\"")]
    UnexpectedLabel(String),

    #[error("invalid certificate request: {0}")]
    Der(String),

    #[error("request signature does not verify: {0}")]
    Signature(String),

    #[error("invalid IP address SAN of {0} bytes")]
    IpAddress(usize),
}

/// Identity claims carried by a PKCS#10 request whose self-signature
/// verifies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRequest {
    /// First subject common name; empty when the subject has none.
    pub common_name: String,
    pub organizations: Vec<String>,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
}

impl ParsedRequest {
    pub fn from_pem(bytes: &[u8]) -> Result<Self, ParseError> {
        let block = pem::parse(bytes)?;
        if block.tag() != CSR_LABEL {
            return Err(ParseError::UnexpectedLabel(block.tag().to_string()));
        }
        Self::from_der(block.contents())
    }

    pub fn from_der(der: &[u8]) -> Result<Self, ParseError> {
        let (rest, csr) =
            X509CertificationRequest::from_der(der).map_err(|e| ParseError::Der(e.to_string()))?;
        if !rest.is_empty() {
            return Err(ParseError::Der(format!(
                "{} trailing bytes after request",
                rest.len()
            )));
        }
        match csr.verify_signature() {
            Ok(()) => {}
            // Algorithms the verifier cannot check (RSA-PSS among them) are
            // accepted unverified; only a signature that fails is malformed.
            Err(X509Error::SignatureUnsupportedAlgorithm) => {
                tracing::debug!("Request signature algorithm unsupported, not verified");
            }
            Err(e) => return Err(ParseError::Signature(e.to_string())),
        }

        let subject = &csr.certification_request_info.subject;

        let common_name = match subject.iter_common_name().next() {
            Some(cn) => cn
                .as_str()
                .map_err(|e| ParseError::Der(format!("common name: {e}")))?
                .to_string(),
            None => String::new(),
        };

        let organizations = subject
            .iter_organization()
            .map(|o| {
                o.as_str()
                    .map(str::to_string)
                    .map_err(|e| ParseError::Der(format!("organization: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut dns_names = Vec::new();
        let mut ip_addresses = Vec::new();
        if let Some(extensions) = csr.requested_extensions() {
            for ext in extensions {
                let ParsedExtension::SubjectAlternativeName(san) = ext else {
                    continue;
                };
                for name in &san.general_names {
                    match name {
                        GeneralName::DNSName(dns) => dns_names.push(dns.to_string()),
                        GeneralName::IPAddress(raw) => ip_addresses.push(ip_from_bytes(raw)?),
                        _ => {}
                    }
                }
            }
        }

        Ok(Self {
            common_name,
            organizations,
            dns_names,
            ip_addresses,
        })
    }
}

fn ip_from_bytes(raw: &[u8]) -> Result<IpAddr, ParseError> {
    if let Ok(octets) = <[u8; 4]>::try_from(raw) {
        return Ok(IpAddr::V4(Ipv4Addr::from(octets)));
    }
    if let Ok(octets) = <[u8; 16]>::try_from(raw) {
        return Ok(IpAddr::V6(Ipv6Addr::from(octets)));
    }
    Err(ParseError::IpAddress(raw.len()))
}
