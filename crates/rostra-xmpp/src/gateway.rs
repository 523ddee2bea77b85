//! File-system storage gateway
//!
//! Each session gets its own directory named after the hex-encoded session id,
//! so any two distinct ids map to distinct, filesystem-safe paths:
//!
//! ```text
//! <data_dir>/<protocol_dir>/<hex(id)>/locale.bin
//! <data_dir>/<protocol_dir>/<hex(id)>/roster.bin
//! ```
//!
//! Ids longer than `MAX_PLAIN_ID_BYTES` would overflow the file name limit, so
//! their directory is `sha256-<hex(sha256(id))>` instead. The two forms never
//! collide because plain names are pure hex.

use std::fs::{self, File};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use rostra_core::{LoadError, RosterStore, SaveError, StorageGateway, StorageLocation, UserEntity};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::FileGatewayConfig;
use crate::envelope::{self, FileKind};

const LOCALE_FILE: &str = "locale.bin";
const ROSTER_FILE: &str = "roster.bin";

/// Longest id stored under its plain hex name (255-byte name limit)
pub const MAX_PLAIN_ID_BYTES: usize = 120;

/// Directory name for session `id`, at most 240 bytes long
pub fn session_dir_name(id: &str) -> String {
    if id.len() <= MAX_PLAIN_ID_BYTES {
        hex::encode(id.as_bytes())
    } else {
        format!("sha256-{}", hex::encode(Sha256::digest(id.as_bytes())))
    }
}

/// Stored roster: the owning session id plus its entries
#[derive(Serialize, Deserialize)]
struct RosterFile<E> {
    owner: String,
    entries: Vec<E>,
}

/// Stores entities as checksummed bincode files
pub struct FileGateway<E> {
    config: FileGatewayConfig,
    _entity: PhantomData<fn() -> E>,
}

impl<E> FileGateway<E> {
    pub fn new(config: FileGatewayConfig) -> Self {
        Self {
            config,
            _entity: PhantomData,
        }
    }

    pub fn config(&self) -> &FileGatewayConfig {
        &self.config
    }

    /// Directory holding everything stored for session `id`
    pub fn session_dir(&self, id: &str) -> PathBuf {
        self.config.protocol_root().join(session_dir_name(id))
    }

    pub fn locale_path(&self, id: &str) -> PathBuf {
        self.session_dir(id).join(LOCALE_FILE)
    }

    pub fn roster_path(&self, id: &str) -> PathBuf {
        self.session_dir(id).join(ROSTER_FILE)
    }

    /// Delete everything stored for session `id`
    pub fn remove_session(&self, id: &str) -> io::Result<()> {
        match fs::remove_dir_all(self.session_dir(id)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, LoadError> {
        let location = StorageLocation::from(path);
        match fs::read(path) {
            Ok(bytes) => {
                debug!("Read {} bytes from {}", bytes.len(), path.display());
                Ok(bytes)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(LoadError::NotFound { location }),
            Err(source) => Err(LoadError::Io { location, source }),
        }
    }

    /// Write via a temp file and rename so readers never see a partial file
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("bin.tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(bytes)?;
            if self.config.sync_on_write {
                file.sync_all()?;
            }
        }
        fs::rename(&temp_path, path)?;

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    fn save(&self, path: &Path, kind: FileKind, value: &impl Serialize) -> Result<(), SaveError> {
        let location = StorageLocation::from(path);
        let bytes = envelope::encode(kind, value).map_err(|e| SaveError::Serialization {
            location: location.clone(),
            reason: e.to_string(),
        })?;
        self.write_atomic(path, &bytes)
            .map_err(|source| SaveError::Io { location, source })
    }
}

impl<E> StorageGateway<E> for FileGateway<E>
where
    E: UserEntity + Clone + Serialize + DeserializeOwned,
{
    fn locale_location(&self, id: &str) -> StorageLocation {
        StorageLocation::from(self.locale_path(id).as_path())
    }

    fn roster_location(&self, id: &str) -> StorageLocation {
        StorageLocation::from(self.roster_path(id).as_path())
    }

    fn load_locale(&self, id: &str) -> Result<E, LoadError> {
        let path = self.locale_path(id);
        let bytes = self.read(&path)?;
        envelope::decode(FileKind::Locale, &bytes)
            .map_err(|e| LoadError::corrupt(StorageLocation::from(path.as_path()), e.to_string()))
    }

    fn save_locale(&mut self, entity: &E) -> Result<(), SaveError> {
        self.save(&self.locale_path(entity.id()), FileKind::Locale, entity)
    }

    fn load_roster(&self, id: &str) -> Result<RosterStore<E>, LoadError> {
        let path = self.roster_path(id);
        let location = StorageLocation::from(path.as_path());
        let bytes = self.read(&path)?;

        let file: RosterFile<E> = envelope::decode(FileKind::Roster, &bytes)
            .map_err(|e| LoadError::corrupt(location.clone(), e.to_string()))?;
        if file.owner != id {
            return Err(LoadError::corrupt(
                location,
                format!("roster belongs to {:?}, not {:?}", file.owner, id),
            ));
        }
        Ok(RosterStore::from_entities(file.entries))
    }

    fn save_roster(&mut self, owner: &str, roster: &RosterStore<E>) -> Result<(), SaveError> {
        let file = RosterFile {
            owner: owner.to_string(),
            entries: roster.snapshot(),
        };
        self.save(&self.roster_path(owner), FileKind::Roster, &file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::XmppUser;

    fn gateway(dir: &Path) -> FileGateway<XmppUser> {
        FileGateway::new(FileGatewayConfig {
            data_dir: dir.to_path_buf(),
            protocol_dir: "xmpp".to_string(),
            sync_on_write: false,
        })
    }

    #[test]
    fn test_paths_are_hex_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(dir.path());

        let path = gateway.locale_path("a/b");
        assert!(path.starts_with(dir.path().join("xmpp")));
        assert!(path.ends_with(Path::new("612f62").join(LOCALE_FILE)));
        assert_ne!(gateway.session_dir("a/b"), gateway.session_dir("a_b"));
    }

    #[test]
    fn test_long_ids_use_bounded_names() {
        let at_limit = "a".repeat(MAX_PLAIN_ID_BYTES);
        assert_eq!(session_dir_name(&at_limit), hex::encode(&at_limit));

        let long = format!("{}@example.org", "a".repeat(1023));
        let name = session_dir_name(&long);
        assert!(name.starts_with("sha256-"));
        assert_eq!(name.len(), 7 + 64);
        assert_ne!(name, session_dir_name(&format!("{}@example.org", "a".repeat(1022))));
    }

    #[test]
    fn test_long_id_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut gateway = gateway(dir.path());
        let jid = format!("{}@example.org", "j".repeat(188));

        gateway.save_locale(&XmppUser::new(jid.clone())).unwrap();
        assert_eq!(gateway.load_locale(&jid).unwrap().jid, jid);
    }

    #[test]
    fn test_missing_files_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(dir.path());

        assert!(gateway.load_locale("juliet@capulet.lit").unwrap_err().is_not_found());
        assert!(gateway.load_roster("juliet@capulet.lit").unwrap_err().is_not_found());
    }

    #[test]
    fn test_roster_owner_mismatch_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let mut gateway = gateway(dir.path());

        let roster = RosterStore::from_entities(vec![XmppUser::new("romeo@montague.lit")]);
        gateway.save_roster("juliet@capulet.lit", &roster).unwrap();
        let target = gateway.roster_path("nurse@capulet.lit");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::copy(gateway.roster_path("juliet@capulet.lit"), &target).unwrap();

        let err = gateway.load_roster("nurse@capulet.lit").unwrap_err();
        assert!(matches!(err, LoadError::CorruptData { .. }));
    }

    #[test]
    fn test_remove_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut gateway = gateway(dir.path());

        gateway.save_locale(&XmppUser::new("juliet@capulet.lit")).unwrap();
        assert!(gateway.locale_path("juliet@capulet.lit").exists());

        gateway.remove_session("juliet@capulet.lit").unwrap();
        assert!(!gateway.session_dir("juliet@capulet.lit").exists());
        gateway.remove_session("juliet@capulet.lit").unwrap();
    }
}
