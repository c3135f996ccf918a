//! Observation records and their TXT wire format.
//!
//! A record is advertised as newline-delimited `key=value` lines:
//!
//! ```text
//! hostname=<string>
//! project_name=<string>
//! device_name=<string>
//! device_id=<string>
//! target_platform=<string>
//! mode=<string>
//! ws_uri=<string>
//! epoch=<integer>
//! pid=<integer>
//! flutter_version=<string>
//! dart_version=<string>
//! dtdUri=<string>
//! ```
//!
//! The last line is only present when the session exposes a Dev Tools Daemon.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::DiscoverError;

pub const HOSTNAME_KEY: &str = "hostname";
pub const PROJECT_NAME_KEY: &str = "project_name";
pub const DEVICE_NAME_KEY: &str = "device_name";
pub const DEVICE_ID_KEY: &str = "device_id";
pub const TARGET_PLATFORM_KEY: &str = "target_platform";
pub const MODE_KEY: &str = "mode";
pub const WS_URI_KEY: &str = "ws_uri";
pub const EPOCH_KEY: &str = "epoch";
pub const PID_KEY: &str = "pid";
pub const FLUTTER_VERSION_KEY: &str = "flutter_version";
pub const DART_VERSION_KEY: &str = "dart_version";

/// Key for the optional Dev Tools Daemon URI.
///
/// This is camelCase while every sibling key is snake_case. Peers already in
/// the field read and write this exact spelling, so it must not be changed.
pub const DTD_URI_KEY: &str = "dtdUri";

/// Keys that must be present for a record to parse.
pub const REQUIRED_KEYS: [&str; 11] = [
    HOSTNAME_KEY,
    PROJECT_NAME_KEY,
    DEVICE_NAME_KEY,
    DEVICE_ID_KEY,
    TARGET_PLATFORM_KEY,
    MODE_KEY,
    WS_URI_KEY,
    EPOCH_KEY,
    PID_KEY,
    FLUTTER_VERSION_KEY,
    DART_VERSION_KEY,
];

/// One discoverable debug session.
///
/// Records are immutable: build one with [`ObservationRecord::builder`] or
/// obtain one from [`ObservationRecord::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationRecord {
    hostname: String,
    project_name: String,
    device_name: String,
    device_id: String,
    target_platform: String,
    mode: String,
    ws_uri: String,
    epoch: u64,
    pid: u64,
    flutter_version: String,
    dart_version: String,
    dtd_uri: Option<String>,
}

impl ObservationRecord {
    /// Start building a record.
    pub fn builder() -> ObservationRecordBuilder {
        ObservationRecordBuilder::default()
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn target_platform(&self) -> &str {
        &self.target_platform
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// VM service URI, exactly as it was supplied.
    pub fn ws_uri(&self) -> &str {
        &self.ws_uri
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn pid(&self) -> u64 {
        self.pid
    }

    pub fn flutter_version(&self) -> &str {
        &self.flutter_version
    }

    pub fn dart_version(&self) -> &str {
        &self.dart_version
    }

    /// Dev Tools Daemon URI, if the session has one.
    pub fn dtd_uri(&self) -> Option<&str> {
        self.dtd_uri.as_deref()
    }

    /// Wire entries in canonical order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            (HOSTNAME_KEY, self.hostname.clone()),
            (PROJECT_NAME_KEY, self.project_name.clone()),
            (DEVICE_NAME_KEY, self.device_name.clone()),
            (DEVICE_ID_KEY, self.device_id.clone()),
            (TARGET_PLATFORM_KEY, self.target_platform.clone()),
            (MODE_KEY, self.mode.clone()),
            (WS_URI_KEY, self.ws_uri.clone()),
            (EPOCH_KEY, self.epoch.to_string()),
            (PID_KEY, self.pid.to_string()),
            (FLUTTER_VERSION_KEY, self.flutter_version.clone()),
            (DART_VERSION_KEY, self.dart_version.clone()),
        ];
        if let Some(ref dtd_uri) = self.dtd_uri {
            entries.push((DTD_URI_KEY, dtd_uri.clone()));
        }
        entries
    }

    /// Key/value export. `dtdUri` is omitted entirely when absent.
    pub fn to_json(&self) -> BTreeMap<String, String> {
        self.entries()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }

    /// Encode as newline-delimited `key=value` text.
    pub fn encode(&self) -> String {
        self.entries()
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parse a record from its wire text.
    ///
    /// Returns `None` for anything malformed: a non-empty line without `=`,
    /// a missing required key, a non-numeric `epoch`/`pid`, or an empty
    /// `ws_uri`. Values are taken verbatim; a repeated key keeps its last
    /// value.
    pub fn parse(text: &str) -> Option<Self> {
        let mut fields: HashMap<&str, &str> = HashMap::new();
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            let (key, value) = line.split_once('=')?;
            fields.insert(key, value);
        }

        let field = |key: &str| fields.get(key).map(|value| value.to_string());

        let ws_uri = field(WS_URI_KEY)?;
        if ws_uri.is_empty() {
            return None;
        }

        Some(Self {
            hostname: field(HOSTNAME_KEY)?,
            project_name: field(PROJECT_NAME_KEY)?,
            device_name: field(DEVICE_NAME_KEY)?,
            device_id: field(DEVICE_ID_KEY)?,
            target_platform: field(TARGET_PLATFORM_KEY)?,
            mode: field(MODE_KEY)?,
            ws_uri,
            epoch: fields.get(EPOCH_KEY)?.parse().ok()?,
            pid: fields.get(PID_KEY)?.parse().ok()?,
            flutter_version: field(FLUTTER_VERSION_KEY)?,
            dart_version: field(DART_VERSION_KEY)?,
            dtd_uri: field(DTD_URI_KEY),
        })
    }
}

impl fmt::Display for ObservationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} ({}, {}) {}",
            self.project_name, self.device_name, self.target_platform, self.mode, self.ws_uri
        )?;
        if let Some(ref dtd_uri) = self.dtd_uri {
            write!(f, " [dtd {dtd_uri}]")?;
        }
        Ok(())
    }
}

/// Builder for [`ObservationRecord`].
#[derive(Debug, Clone, Default)]
pub struct ObservationRecordBuilder {
    hostname: String,
    project_name: String,
    device_name: String,
    device_id: String,
    target_platform: String,
    mode: String,
    ws_uri: String,
    epoch: u64,
    pid: u64,
    flutter_version: String,
    dart_version: String,
    dtd_uri: Option<String>,
}

impl ObservationRecordBuilder {
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn with_project_name(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = project_name.into();
        self
    }

    pub fn with_device_name(mut self, device_name: impl Into<String>) -> Self {
        self.device_name = device_name.into();
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    pub fn with_target_platform(mut self, target_platform: impl Into<String>) -> Self {
        self.target_platform = target_platform.into();
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn with_ws_uri(mut self, ws_uri: impl Into<String>) -> Self {
        self.ws_uri = ws_uri.into();
        self
    }

    pub fn with_epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn with_pid(mut self, pid: u64) -> Self {
        self.pid = pid;
        self
    }

    pub fn with_flutter_version(mut self, flutter_version: impl Into<String>) -> Self {
        self.flutter_version = flutter_version.into();
        self
    }

    pub fn with_dart_version(mut self, dart_version: impl Into<String>) -> Self {
        self.dart_version = dart_version.into();
        self
    }

    /// Set or clear the Dev Tools Daemon URI.
    pub fn with_dtd_uri(mut self, dtd_uri: Option<impl Into<String>>) -> Self {
        self.dtd_uri = dtd_uri.map(Into::into);
        self
    }

    /// Finish the record. Fails when no VM service URI was given.
    pub fn build(self) -> Result<ObservationRecord, DiscoverError> {
        if self.ws_uri.is_empty() {
            return Err(DiscoverError::InvalidInput(
                "ws_uri must not be empty".to_string(),
            ));
        }
        Ok(ObservationRecord {
            hostname: self.hostname,
            project_name: self.project_name,
            device_name: self.device_name,
            device_id: self.device_id,
            target_platform: self.target_platform,
            mode: self.mode,
            ws_uri: self.ws_uri,
            epoch: self.epoch,
            pid: self.pid,
            flutter_version: self.flutter_version,
            dart_version: self.dart_version,
            dtd_uri: self.dtd_uri,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WITHOUT_DTD: &str = "hostname=host\n\
        project_name=project\n\
        device_name=device\n\
        device_id=device_id\n\
        target_platform=android\n\
        mode=debug\n\
        ws_uri=http://127.0.0.1:1234/auth/\n\
        epoch=0\n\
        pid=1\n\
        flutter_version=1.0.0\n\
        dart_version=2.0.0";

    fn with_dtd() -> String {
        format!("{WITHOUT_DTD}\ndtdUri=http://127.0.0.1:4321/auth/")
    }

    fn sample_record(dtd_uri: Option<&str>) -> ObservationRecord {
        ObservationRecord::builder()
            .with_hostname("host")
            .with_project_name("project")
            .with_device_name("device")
            .with_device_id("device_id")
            .with_target_platform("android")
            .with_mode("debug")
            .with_ws_uri("http://127.0.0.1:1234/auth/")
            .with_epoch(0)
            .with_pid(1)
            .with_flutter_version("1.0.0")
            .with_dart_version("2.0.0")
            .with_dtd_uri(dtd_uri)
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_with_dtd_uri() {
        let record = ObservationRecord::parse(&with_dtd()).unwrap();
        assert_eq!(record.dtd_uri(), Some("http://127.0.0.1:4321/auth/"));
        assert_eq!(record.hostname(), "host");
        assert_eq!(record.project_name(), "project");
        assert_eq!(record.device_name(), "device");
        assert_eq!(record.device_id(), "device_id");
        assert_eq!(record.target_platform(), "android");
        assert_eq!(record.mode(), "debug");
        assert_eq!(record.ws_uri(), "http://127.0.0.1:1234/auth/");
        assert_eq!(record.epoch(), 0);
        assert_eq!(record.pid(), 1);
        assert_eq!(record.flutter_version(), "1.0.0");
        assert_eq!(record.dart_version(), "2.0.0");
    }

    #[test]
    fn test_parse_without_dtd_uri() {
        let record = ObservationRecord::parse(WITHOUT_DTD).unwrap();
        assert_eq!(record.dtd_uri(), None);
        assert!(!record.to_json().contains_key(DTD_URI_KEY));
    }

    #[test]
    fn test_to_json_includes_dtd_uri_when_present() {
        let json = sample_record(Some("ws://127.0.0.1:4321/x")).to_json();
        assert_eq!(json.get(DTD_URI_KEY).map(String::as_str), Some("ws://127.0.0.1:4321/x"));
        assert_eq!(json.len(), 12);
    }

    #[test]
    fn test_to_json_keeps_empty_required_values() {
        let record = ObservationRecord::builder()
            .with_ws_uri("http://127.0.0.1:1/")
            .build()
            .unwrap();
        let json = record.to_json();
        assert_eq!(json.len(), 11);
        for key in REQUIRED_KEYS {
            assert!(json.contains_key(key), "missing {key}");
        }
        assert_eq!(json[HOSTNAME_KEY], "");
        assert_eq!(json[EPOCH_KEY], "0");
    }

    #[test]
    fn test_parse_missing_any_required_key() {
        for missing in REQUIRED_KEYS {
            let text: String = with_dtd()
                .lines()
                .filter(|line| !line.starts_with(&format!("{missing}=")))
                .collect::<Vec<_>>()
                .join("\n");
            assert!(
                ObservationRecord::parse(&text).is_none(),
                "parsed without {missing}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_non_numeric_epoch_and_pid() {
        let bad_epoch = WITHOUT_DTD.replace("epoch=0", "epoch=yesterday");
        assert!(ObservationRecord::parse(&bad_epoch).is_none());

        let bad_pid = WITHOUT_DTD.replace("pid=1", "pid=-1");
        assert!(ObservationRecord::parse(&bad_pid).is_none());
    }

    #[test]
    fn test_parse_accepts_pid_beyond_32_bits() {
        let text = WITHOUT_DTD.replace("pid=1", "pid=4294967296");
        let record = ObservationRecord::parse(&text).unwrap();
        assert_eq!(record.pid(), 4_294_967_296);
        assert!(record.encode().contains("pid=4294967296"));
    }

    #[test]
    fn test_parse_rejects_line_without_separator() {
        let text = format!("{WITHOUT_DTD}\ngarbage");
        assert!(ObservationRecord::parse(&text).is_none());
    }

    #[test]
    fn test_parse_rejects_empty_ws_uri() {
        let text = WITHOUT_DTD.replace("ws_uri=http://127.0.0.1:1234/auth/", "ws_uri=");
        assert!(ObservationRecord::parse(&text).is_none());
    }

    #[test]
    fn test_parse_splits_on_first_equals_only() {
        let text = WITHOUT_DTD.replace(
            "ws_uri=http://127.0.0.1:1234/auth/",
            "ws_uri=ws://127.0.0.1:1234/a=b==/ws",
        );
        let record = ObservationRecord::parse(&text).unwrap();
        assert_eq!(record.ws_uri(), "ws://127.0.0.1:1234/a=b==/ws");
    }

    #[test]
    fn test_parse_last_duplicate_wins() {
        let text = format!("{WITHOUT_DTD}\nmode=profile\ndtdUri=first\ndtdUri=second");
        let record = ObservationRecord::parse(&text).unwrap();
        assert_eq!(record.mode(), "profile");
        assert_eq!(record.dtd_uri(), Some("second"));
    }

    #[test]
    fn test_parse_keeps_values_verbatim() {
        let text = WITHOUT_DTD
            .replace("device_name=device", "device_name= Pixel 7 ")
            .replace(
                "ws_uri=http://127.0.0.1:1234/auth/",
                "ws_uri=HTTPS://Example.COM:8443/a%20b",
            );
        let record = ObservationRecord::parse(&format!("\n{text}\n\n")).unwrap();
        assert_eq!(record.device_name(), " Pixel 7 ");
        assert_eq!(record.ws_uri(), "HTTPS://Example.COM:8443/a%20b");
    }

    #[test]
    fn test_parse_accepts_crlf_lines() {
        let text = with_dtd().replace('\n', "\r\n");
        let record = ObservationRecord::parse(&text).unwrap();
        assert_eq!(record.dtd_uri(), Some("http://127.0.0.1:4321/auth/"));
        assert_eq!(record.dart_version(), "2.0.0");
    }

    #[test]
    fn test_parse_explicit_empty_dtd_uri_is_a_value() {
        let record = ObservationRecord::parse(&format!("{WITHOUT_DTD}\ndtdUri=")).unwrap();
        assert_eq!(record.dtd_uri(), Some(""));
    }

    #[test]
    fn test_encode_matches_wire_layout() {
        assert_eq!(sample_record(None).encode(), WITHOUT_DTD);
        assert_eq!(
            sample_record(Some("http://127.0.0.1:4321/auth/")).encode(),
            with_dtd()
        );
    }

    #[test]
    fn test_encoded_record_parses_back() {
        let record = sample_record(Some("http://127.0.0.1:4321/auth/"));
        assert_eq!(ObservationRecord::parse(&record.encode()), Some(record));
    }

    #[test]
    fn test_builder_rejects_empty_ws_uri() {
        let result = ObservationRecord::builder().with_project_name("app").build();
        assert!(matches!(result, Err(DiscoverError::InvalidInput(_))));
    }

    #[test]
    fn test_display() {
        let record = sample_record(Some("ws://dtd"));
        assert_eq!(
            record.to_string(),
            "project on device (android, debug) http://127.0.0.1:1234/auth/ [dtd ws://dtd]"
        );
    }
}
