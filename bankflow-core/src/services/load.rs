//! Load step - persist a batch of banks as one transaction

use std::sync::Arc;

use crate::domain::result::Result;
use crate::domain::BankRecord;
use crate::ports::{BankRepository, Session};

/// Writes transformed banks to the repository
pub struct LoadService {
    repository: Arc<dyn BankRepository>,
}

impl LoadService {
    pub fn new(repository: Arc<dyn BankRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<dyn BankRepository> {
        &self.repository
    }

    /// Insert every bank in a fresh session, all or nothing.
    ///
    /// Returns the number of rows inserted.
    pub fn load(&self, banks: &[BankRecord]) -> Result<usize> {
        let session = self.repository.open_session()?;
        Self::load_with_session(session, banks)
    }

    /// Insert every bank through a caller-supplied session.
    ///
    /// The session is consumed: it is committed on success, rolled back on
    /// any insert failure, and released on every path. The insert error is
    /// returned even if the rollback itself fails.
    pub fn load_with_session(
        mut session: Box<dyn Session + '_>,
        banks: &[BankRecord],
    ) -> Result<usize> {
        match session.insert_banks(banks) {
            Ok(inserted) => {
                session.commit()?;
                Ok(inserted)
            }
            Err(err) => {
                // Original error wins over a rollback failure
                let _ = session.rollback();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::adapters::duckdb::DuckDbRepository;
    use crate::domain::result::Error;
    use crate::domain::TableSchema;

    fn create_repo() -> Arc<DuckDbRepository> {
        let repo = DuckDbRepository::open_in_memory(TableSchema::banks()).unwrap();
        repo.ensure_schema().unwrap();
        Arc::new(repo)
    }

    fn sample_batch() -> Vec<BankRecord> {
        vec![
            BankRecord::new("00000000", "BCO DO BRASIL S.A.", 1, "Banco do Brasil S.A."),
            BankRecord::new("00360305", "CAIXA ECONOMICA FEDERAL", 104, "CAIXA ECONOMICA FEDERAL"),
            BankRecord::new("60746948", "BCO BRADESCO S.A.", 237, "Banco Bradesco S.A."),
        ]
    }

    /// Session double that records the calls it receives
    struct RecordingSession {
        events: Arc<Mutex<Vec<&'static str>>>,
        fail_insert: bool,
        fail_commit: bool,
    }

    impl RecordingSession {
        fn boxed(
            events: &Arc<Mutex<Vec<&'static str>>>,
            fail_insert: bool,
            fail_commit: bool,
        ) -> Box<dyn Session> {
            Box::new(Self {
                events: Arc::clone(events),
                fail_insert,
                fail_commit,
            })
        }

        fn push(&self, event: &'static str) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl Session for RecordingSession {
        fn insert_banks(&mut self, banks: &[BankRecord]) -> Result<usize> {
            self.push("insert");
            if self.fail_insert {
                return Err(Error::persistence("connection lost"));
            }
            Ok(banks.len())
        }

        fn commit(self: Box<Self>) -> Result<()> {
            self.push("commit");
            if self.fail_commit {
                return Err(Error::persistence("commit failed"));
            }
            Ok(())
        }

        fn rollback(self: Box<Self>) -> Result<()> {
            self.push("rollback");
            Err(Error::persistence("rollback failed too"))
        }
    }

    impl Drop for RecordingSession {
        fn drop(&mut self) {
            self.push("close");
        }
    }

    #[test]
    fn test_load_inserts_all_rows() {
        let repo = create_repo();
        let service = LoadService::new(repo.clone());
        let batch = sample_batch();

        assert_eq!(repo.count_banks().unwrap(), 0);
        assert_eq!(service.load(&batch).unwrap(), 3);

        let stored = repo.get_banks().unwrap();
        assert_eq!(stored.len(), batch.len());
        for (row, record) in stored.iter().zip(&batch) {
            assert!(row.matches(record), "{:?} != {:?}", row, record);
        }
    }

    #[test]
    fn test_load_duplicate_ispb_rolls_back_everything() {
        let repo = create_repo();
        let service = LoadService::new(repo.clone());

        let mut batch = sample_batch();
        batch.push(BankRecord::new("00000000", "Duplicate", 2, "Duplicate Bank"));

        let err = service.load(&batch).unwrap_err();

        assert!(matches!(err, Error::Persistence(_)));
        assert_eq!(repo.count_banks().unwrap(), 0);
    }

    #[test]
    fn test_load_after_failed_load_succeeds() {
        let repo = create_repo();
        let service = LoadService::new(repo.clone());

        let mut bad = sample_batch();
        bad.push(bad[0].clone());
        assert!(service.load(&bad).is_err());

        assert_eq!(service.load(&sample_batch()).unwrap(), 3);
        assert_eq!(repo.count_banks().unwrap(), 3);
    }

    #[test]
    fn test_load_empty_batch() {
        let repo = create_repo();
        let service = LoadService::new(repo.clone());
        assert_eq!(service.load(&[]).unwrap(), 0);
        assert_eq!(repo.count_banks().unwrap(), 0);
    }

    #[test]
    fn test_injected_session_is_committed_and_closed() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let session = RecordingSession::boxed(&events, false, false);

        let inserted = LoadService::load_with_session(session, &sample_batch()).unwrap();

        assert_eq!(inserted, 3);
        assert_eq!(*events.lock().unwrap(), vec!["insert", "commit", "close"]);
    }

    #[test]
    fn test_injected_session_insert_failure_rolls_back() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let session = RecordingSession::boxed(&events, true, false);

        let err = LoadService::load_with_session(session, &sample_batch()).unwrap_err();

        // The insert error is surfaced, not the rollback error
        assert!(err.to_string().contains("connection lost"));
        assert_eq!(*events.lock().unwrap(), vec!["insert", "rollback", "close"]);
    }

    #[test]
    fn test_injected_session_commit_failure_still_closes() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let session = RecordingSession::boxed(&events, false, true);

        let err = LoadService::load_with_session(session, &sample_batch()).unwrap_err();

        assert!(err.to_string().contains("commit failed"));
        assert_eq!(*events.lock().unwrap(), vec!["insert", "commit", "close"]);
    }

    #[test]
    fn test_injected_duckdb_session() {
        let repo = create_repo();
        let session = repo.open_session().unwrap();

        LoadService::load_with_session(session, &sample_batch()).unwrap();

        assert_eq!(repo.count_banks().unwrap(), 3);
    }
}
