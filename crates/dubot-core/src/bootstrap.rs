//! First-boot seeding of the query store.
//!
//! A fresh store supports no queries, which makes every request come back
//! unsupported. When the store is empty this installs one starter record per
//! shipped adapter category so the facade works out of the box; operators
//! manage the real query set afterwards through the store CRUD.

use crate::store::{QueryRecord, QueryStore, StoreError};

/// Starter query set, one record per shipped adapter category.
pub fn default_queries() -> Vec<QueryRecord> {
    vec![
        QueryRecord::new(
            1,
            "collection",
            "What new DUs were introduced at <promotion_stage> on <date>?",
        ),
        QueryRecord::new(
            2,
            "confluence",
            "What version of Kubernetes is running on <cadence_cluster>?",
        ),
        QueryRecord::new(
            3,
            "du_queries",
            "What is the <feature> of <du_name> at <du_promotion_stage>?",
        ),
        QueryRecord::new(
            4,
            "orderables",
            "Is my <sellable_unit_name> in the NA (nearly all) order?",
        ),
        QueryRecord::new(
            5,
            "scribe",
            "What were the last <num_recent_commits> changes in the new build of <du_name>?",
        ),
        QueryRecord::new(6, "support", "What are the currently supported cadences?"),
        QueryRecord::new(7, "teemo", "Who are the test engineers for <du_name>?"),
        QueryRecord::new(
            8,
            "time",
            "How long did <du_name> take to promote from <first_promotion_stage> to <second_promotion_stage>?",
        ),
    ]
}

/// Seeds the starter query set if the store is empty.
///
/// Returns `Ok(true)` when seeding ran, `Ok(false)` when records already
/// existed. Safe to call on every boot.
pub fn seed_default_queries(store: &QueryStore) -> Result<bool, StoreError> {
    if store.count()? > 0 {
        tracing::info!(
            target: "dubot::bootstrap",
            "query store already populated, skipping seed"
        );
        return Ok(false);
    }

    let queries = default_queries();
    for record in &queries {
        store.insert(record)?;
    }
    tracing::info!(
        target: "dubot::bootstrap",
        count = queries.len(),
        "✓ seeded starter query records"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn seeds_once_then_skips() {
        let dir = tempdir().unwrap();
        let store = QueryStore::open_path(dir.path()).unwrap();

        assert!(seed_default_queries(&store).unwrap());
        assert_eq!(store.count().unwrap(), default_queries().len());

        // second boot leaves the set alone
        assert!(!seed_default_queries(&store).unwrap());
        assert_eq!(store.count().unwrap(), default_queries().len());
    }

    #[test]
    fn existing_records_are_never_overwritten() {
        let dir = tempdir().unwrap();
        let store = QueryStore::open_path(dir.path()).unwrap();
        let custom = QueryRecord::new(1, "time", "operator-managed question");
        store.insert(&custom).unwrap();

        assert!(!seed_default_queries(&store).unwrap());
        assert_eq!(store.get_by_id(1).unwrap(), Some(custom));
    }
}
