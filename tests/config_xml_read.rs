use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

use katal::config::load_config_from_xml_path;
use katal::{KatalError, LogLevel, Verbosity};

#[test]
fn reads_paths_sieves_and_log_settings() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    let xml = r#"<config>
  <source>
    <path>  /data/photos  </path>
    <sieve>
      <name>IMG_</name>
    </sieve>
    <sieve>
      <name>.*\.png$</name>
      <size>&gt;=4096</size>
    </sieve>
  </source>
  <target>
    <path>/data/archive</path>
    <name_of_target_files>DATE2__HASHID.SOURCE_EXTENSION2</name_of_target_files>
  </target>
  <log>
    <use_log_file>false</use_log_file>
    <verbosity>high</verbosity>
    <level>quiet</level>
  </log>
</config>"#;
    fs::write(&cfg_path, xml).unwrap();

    let cfg = load_config_from_xml_path(&cfg_path).unwrap();
    assert_eq!(cfg.source_path, PathBuf::from("/data/photos"));
    assert_eq!(cfg.target_path, PathBuf::from("/data/archive"));
    assert_eq!(
        cfg.target_name_template.as_str(),
        "DATE2__HASHID.SOURCE_EXTENSION2"
    );
    assert_eq!(cfg.sieves.len(), 2);
    assert!(cfg.sieves[0].accepts("IMG_0001.jpg", 1));
    assert!(!cfg.sieves[0].accepts("photo_IMG_0001.jpg", 1));
    assert!(cfg.sieves[1].accepts("x.png", 4096));
    assert!(!cfg.sieves[1].accepts("x.png", 4095));
    assert_eq!(cfg.verbosity, Verbosity::High);
    assert_eq!(cfg.log_level, LogLevel::Quiet);
    assert!(cfg.effective_log_file().is_none());
}

#[test]
fn malformed_xml_is_a_config_error() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(
        &cfg_path,
        "<config>\n  <source><path>/s</path>\n  <target><path>/t\n</config>",
    )
    .unwrap();
    let err = load_config_from_xml_path(&cfg_path).unwrap_err();
    assert!(err.is_config(), "{err:?}");
    assert!(err.to_string().contains("config.xml"));
}

#[test]
fn missing_file_is_an_io_error() {
    let td = tempdir().unwrap();
    let err = load_config_from_xml_path(&td.path().join("absent.xml")).unwrap_err();
    assert!(matches!(err, KatalError::FileIo { .. }));
}

#[test]
fn invalid_regex_is_reported_with_its_sieve() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(
        &cfg_path,
        r#"<config><source><path>/s</path><sieve><name>([unclosed</name></sieve></source>
<target><path>/t</path><name_of_target_files>HASHID</name_of_target_files></target></config>"#,
    )
    .unwrap();
    let err = load_config_from_xml_path(&cfg_path).unwrap_err();
    assert!(matches!(
        err,
        KatalError::InvalidSieve { index: 1, field: "name", .. }
    ));
    assert_eq!(err.code(), 12);
}

#[test]
fn use_log_file_without_path_falls_back_to_default() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(
        &cfg_path,
        r#"<config><source><path>/s</path></source>
<target><path>/t</path><name_of_target_files>HASHID</name_of_target_files></target>
<log><use_log_file>true</use_log_file><file></file></log></config>"#,
    )
    .unwrap();
    let cfg = load_config_from_xml_path(&cfg_path).unwrap();
    assert!(cfg.use_log_file);
    assert_eq!(cfg.log_file, katal::default_log_path());
}
