use std::path::{Path, PathBuf};

use scadforge_types::{Result, SessionRecord};

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Persists session metadata as a side effect of a generation call. The loop
/// controller only calls this when the caller handed a store in.
pub trait SessionStore: Send + Sync {
    fn save(&self, record: &SessionRecord) -> Result<PathBuf>;
}

/// Writes one pretty-printed JSON sidecar file per session, named by the
/// session id.
#[derive(Debug, Clone)]
pub struct JsonSessionStore {
    dir: PathBuf,
}

impl JsonSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SessionStore for JsonSessionStore {
    fn save(&self, record: &SessionRecord) -> Result<PathBuf> {
        let path = self.dir.join(format!("{}.json", record.session_id));
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, json)?;
        tracing::debug!(path = %path.display(), "session record saved");
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use scadforge_types::{ComplexityReport, RenderTimeEstimate};

    fn sample_record() -> SessionRecord {
        SessionRecord {
            session_id: uuid::Uuid::new_v4(),
            prompt: "a 10mm cube".into(),
            enhanced_prompt: None,
            libraries: vec!["BOSL2".into()],
            valid: true,
            complexity: ComplexityReport {
                primitives_count: 1,
                operations_count: 0,
                modules_count: 0,
                variables_count: 0,
                complexity_score: 1.0,
                render_time_estimate: RenderTimeEstimate::Quick,
                recommendations: vec![],
            },
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn save_writes_sidecar_named_by_session_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSessionStore::new(dir.path()).unwrap();
        let record = sample_record();
        let path = store.save(&record).unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(&record.session_id.to_string()));

        let loaded: SessionRecord =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.session_id, record.session_id);
        assert_eq!(loaded.prompt, "a 10mm cube");
        assert!(loaded.valid);
    }
}
