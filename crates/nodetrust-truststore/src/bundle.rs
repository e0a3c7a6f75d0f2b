//! PEM bundle scanning.
//!
//! A bundle is zero or more PEM certificate blocks concatenated with
//! arbitrary whitespace between them. The reader scans for the literal
//! end marker; everything from the previous marker (or the start of input)
//! up to and including the next marker is one token, decoded first as PEM
//! and then as a DER certificate.
//!
//! Text outside certificate blocks is ignored wherever it appears, so the
//! comment headers some distributions put before each block are harmless.
//! Leftover input after the last end marker is an unterminated block only
//! if it opens one (`-----BEGIN`).
//!
//! The scan is incremental over any `Read`, so a large bundle file is never
//! decoded in a single call.

use std::io::{self, Read};
use std::path::Path;

use crate::certificate::{Certificate, InvalidCertificate};

const END_MARKER: &[u8] = b"-----END CERTIFICATE-----";
const BEGIN_MARKER: &[u8] = b"-----BEGIN";
const CERTIFICATE_LABEL: &str = "CERTIFICATE";
const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("unterminated certificate block (token {index})")]
    Unterminated { index: usize },

    #[error("certificate {index}: invalid PEM: {source}")]
    Pem {
        index: usize,
        #[source]
        source: pem::PemError,
    },

    #[error("certificate {index}: unexpected PEM label {label:?}")]
    UnexpectedLabel { index: usize, label: String },

    #[error("certificate {index}: {source}")]
    Der {
        index: usize,
        #[source]
        source: InvalidCertificate,
    },

    #[error("io error reading bundle: {0}")]
    Io(#[from] io::Error),
}

impl BundleError {
    /// Position of the offending token, when the failure is tied to one.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Unterminated { index }
            | Self::Pem { index, .. }
            | Self::UnexpectedLabel { index, .. }
            | Self::Der { index, .. } => Some(*index),
            Self::Io(_) => None,
        }
    }
}

/// Incremental certificate scanner over a byte stream.
///
/// Yields one `Certificate` per terminated block. The first error ends
/// the iteration.
pub struct BundleReader<R> {
    reader: R,
    buf: Vec<u8>,
    /// Prefix of `buf` already searched without finding a marker.
    scanned: usize,
    index: usize,
    eof: bool,
    done: bool,
}

impl<R: Read> BundleReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            scanned: 0,
            index: 0,
            eof: false,
            done: false,
        }
    }

    /// Offset one past the end of the next marker in `buf`, if present.
    fn find_marker(&mut self) -> Option<usize> {
        // A marker may straddle the previous read boundary.
        let start = self.scanned.saturating_sub(END_MARKER.len() - 1);
        match self.buf[start..]
            .windows(END_MARKER.len())
            .position(|w| w == END_MARKER)
        {
            Some(pos) => Some(start + pos + END_MARKER.len()),
            None => {
                self.scanned = self.buf.len();
                None
            }
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; CHUNK_SIZE];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl<R: Read> Iterator for BundleReader<R> {
    type Item = Result<Certificate, BundleError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if let Some(end) = self.find_marker() {
                let token: Vec<u8> = self.buf.drain(..end).collect();
                self.scanned = 0;
                let index = self.index;
                self.index += 1;

                let result = decode_token(index, &token);
                if result.is_err() {
                    self.done = true;
                }
                return Some(result);
            }

            if self.eof {
                self.done = true;
                if !contains(&self.buf, BEGIN_MARKER) {
                    return None;
                }
                return Some(Err(BundleError::Unterminated { index: self.index }));
            }

            if let Err(e) = self.fill() {
                self.done = true;
                return Some(Err(e.into()));
            }
        }
    }
}

fn decode_token(index: usize, token: &[u8]) -> Result<Certificate, BundleError> {
    let block = pem::parse(token).map_err(|source| BundleError::Pem { index, source })?;
    if block.tag() != CERTIFICATE_LABEL {
        return Err(BundleError::UnexpectedLabel {
            index,
            label: block.tag().to_string(),
        });
    }
    Certificate::from_der(block.into_contents())
        .map_err(|source| BundleError::Der { index, source })
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Parse every certificate in an in-memory bundle.
pub fn parse_bundle(bytes: &[u8]) -> Result<Vec<Certificate>, BundleError> {
    BundleReader::new(bytes).collect()
}

/// Parse every certificate in the bundle file at `path`.
pub fn read_bundle_file(path: &Path) -> Result<Vec<Certificate>, BundleError> {
    let file = std::fs::File::open(path)?;
    let certs: Vec<Certificate> = BundleReader::new(file).collect::<Result<_, _>>()?;
    tracing::debug!(path = %path.display(), count = certs.len(), "Bundle parsed");
    Ok(certs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_cert(cn: &str) -> Certificate {
        let key = rcgen::KeyPair::generate().unwrap();
        let mut params = rcgen::CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name.push(rcgen::DnType::CommonName, cn);
        Certificate::from_der(params.self_signed(&key).unwrap().der().to_vec()).unwrap()
    }

    /// Reader that hands out at most `step` bytes per call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(out.len()).min(self.data.len());
            out[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn empty_input_is_empty_bundle() {
        assert!(parse_bundle(b"").unwrap().is_empty());
    }

    #[test]
    fn whitespace_only_input_is_empty_bundle() {
        assert!(parse_bundle(b" \n\r\n\t").unwrap().is_empty());
    }

    #[test]
    fn round_trips_zero_one_and_five_certificates() {
        for n in [0usize, 1, 5] {
            let originals: Vec<Certificate> =
                (0..n).map(|i| make_cert(&format!("root-{i}"))).collect();
            let bundle: String = originals.iter().map(Certificate::to_pem).collect();

            let parsed = parse_bundle(bundle.as_bytes()).unwrap();
            assert_eq!(parsed.len(), n);
            for (a, b) in parsed.iter().zip(&originals) {
                assert_eq!(a.der(), b.der());
            }
        }
    }

    #[test]
    fn tolerates_interleaved_whitespace() {
        let a = make_cert("a");
        let b = make_cert("b");
        let bundle = format!("\n\n{}\n   \n\t{}\n\n", a.to_pem(), b.to_pem());
        let parsed = parse_bundle(bundle.as_bytes()).unwrap();
        assert_eq!(parsed, vec![a, b]);
    }

    #[test]
    fn marker_split_across_reads_is_found() {
        let certs: Vec<Certificate> = (0..3).map(|i| make_cert(&format!("t{i}"))).collect();
        let bundle: String = certs.iter().map(Certificate::to_pem).collect();

        for step in [1usize, 7, 24, 25, 26, 1000] {
            let reader = Trickle {
                data: bundle.as_bytes(),
                step,
            };
            let parsed: Vec<Certificate> = BundleReader::new(reader)
                .collect::<Result<_, _>>()
                .unwrap();
            assert_eq!(parsed, certs, "step {step}");
        }
    }

    #[test]
    fn comment_lines_outside_blocks_are_ignored() {
        let a = make_cert("a");
        let b = make_cert("b");
        let bundle = format!(
            "# Root A\n{}# Root B\nsome notes\n{}# end of bundle\n",
            a.to_pem(),
            b.to_pem()
        );
        assert_eq!(parse_bundle(bundle.as_bytes()).unwrap(), vec![a, b]);
    }

    #[test]
    fn trailing_text_without_block_start_is_ignored() {
        let a = make_cert("a");
        let bundle = format!("{}trailing comment", a.to_pem());
        assert_eq!(parse_bundle(bundle.as_bytes()).unwrap(), vec![a]);
        assert!(parse_bundle(b"just a comment\n").unwrap().is_empty());
    }

    #[test]
    fn opened_block_without_end_is_unterminated() {
        let a = make_cert("a");
        let bundle = format!("{}# next\n-----BEGIN CERTIFICATE-----\nMIIB", a.to_pem());
        let err = parse_bundle(bundle.as_bytes()).unwrap_err();
        assert!(matches!(err, BundleError::Unterminated { index: 1 }), "{err}");
    }

    #[test]
    fn truncated_bundle_is_unterminated() {
        let a = make_cert("a");
        let b = make_cert("b");
        let full = format!("{}{}", a.to_pem(), b.to_pem());
        let truncated = &full[..full.len() - 40];

        let err = parse_bundle(truncated.as_bytes()).unwrap_err();
        assert!(matches!(err, BundleError::Unterminated { index: 1 }));
        assert!(err.to_string().contains("unterminated certificate block"));
    }

    #[test]
    fn bad_base64_reports_token_index() {
        let a = make_cert("a");
        let bundle = format!(
            "{}-----BEGIN CERTIFICATE-----\n!!!not base64!!!\n-----END CERTIFICATE-----\n",
            a.to_pem()
        );
        let err = parse_bundle(bundle.as_bytes()).unwrap_err();
        assert!(matches!(err, BundleError::Pem { index: 1, .. }), "{err}");
        assert_eq!(err.index(), Some(1));
    }

    #[test]
    fn bad_der_reports_token_index() {
        let junk = pem::encode(&pem::Pem::new("CERTIFICATE", vec![1u8, 2, 3, 4]));
        let err = parse_bundle(junk.as_bytes()).unwrap_err();
        assert!(matches!(err, BundleError::Der { index: 0, .. }), "{err}");
    }

    #[test]
    fn wrong_label_is_rejected() {
        let a = make_cert("a");
        let relabeled = pem::encode(&pem::Pem::new("X509 CRL", a.der().to_vec()))
            .replace("-----END X509 CRL-----", "-----END CERTIFICATE-----");
        let err = parse_bundle(relabeled.as_bytes()).unwrap_err();
        assert!(matches!(err, BundleError::Pem { .. } | BundleError::UnexpectedLabel { .. }));
    }

    #[test]
    fn non_certificate_block_before_marker_is_unexpected_label() {
        let a = make_cert("a");
        let crl = pem::encode(&pem::Pem::new("X509 CRL", vec![0x30, 0x00]));
        let bundle = format!("{crl}{}", a.to_pem());
        let err = parse_bundle(bundle.as_bytes()).unwrap_err();
        match err {
            BundleError::UnexpectedLabel { index, label } => {
                assert_eq!(index, 0);
                assert_eq!(label, "X509 CRL");
            }
            other => panic!("expected UnexpectedLabel, got: {other}"),
        }
    }

    #[test]
    fn iteration_stops_after_first_error() {
        let junk = pem::encode(&pem::Pem::new("CERTIFICATE", vec![9u8; 8]));
        let good = make_cert("good");
        let bundle = format!("{}{}", junk, good.to_pem());

        let mut reader = BundleReader::new(bundle.as_bytes());
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn reads_bundle_file_from_disk() {
        let dir = nodetrust_common::test::scratch_dir("bundle-file");
        let path = dir.join("ca-bundle.pem");
        let certs = vec![make_cert("x"), make_cert("y")];
        let text: String = certs.iter().map(Certificate::to_pem).collect();
        std::fs::write(&path, text).unwrap();

        assert_eq!(read_bundle_file(&path).unwrap(), certs);
    }

    #[test]
    fn missing_bundle_file_is_io_error() {
        let dir = nodetrust_common::test::scratch_dir("bundle-missing");
        let err = read_bundle_file(&dir.join("nope.pem")).unwrap_err();
        assert!(matches!(err, BundleError::Io(_)));
    }
}
