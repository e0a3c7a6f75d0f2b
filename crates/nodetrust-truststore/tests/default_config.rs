//! Runs in its own process: it points the data directory at a scratch dir.

use nodetrust_common::paths::{self, DATA_DIR_ENV};
use nodetrust_truststore::config::{load_default_sync_config, sync_from_config, StoreConfig};
use nodetrust_truststore::{Certificate, StoreHandle};

fn make_cert(cn: &str) -> Certificate {
    let key = rcgen::KeyPair::generate().unwrap();
    let mut params = rcgen::CertificateParams::new(Vec::<String>::new()).unwrap();
    params.distinguished_name.push(rcgen::DnType::CommonName, cn);
    Certificate::from_der(params.self_signed(&key).unwrap().der().to_vec()).unwrap()
}

#[test]
fn sync_is_driven_by_shared_config_file() {
    let dir = nodetrust_common::test::scratch_dir("default-sync-config");
    std::env::set_var(DATA_DIR_ENV, &dir);

    let cfg = load_default_sync_config().unwrap();
    assert_eq!(cfg.bundle_path, dir.join("ca-bundle.pem"));
    assert_eq!(cfg.store, StoreConfig::System);

    let anchors = dir.join("anchors");
    std::fs::write(
        paths::config_path(),
        format!(
            "[trust_sync]\nname_prefix = \"cluster\"\n\n[trust_sync.store]\n\
             kind = \"directory\"\nanchor_dir = '{}'\n",
            anchors.display()
        ),
    )
    .unwrap();
    let cert = make_cert("root");
    std::fs::write(dir.join("ca-bundle.pem"), cert.to_pem()).unwrap();

    let cfg = load_default_sync_config().unwrap();
    assert_eq!(cfg.name_prefix, "cluster");
    assert!(sync_from_config(&cfg).unwrap());
    assert!(!sync_from_config(&cfg).unwrap());
    assert_eq!(cfg.open_store().unwrap().list_certificates().unwrap(), vec![cert]);
}
