//! Property tests for transactional rollback through the public API.

use proptest::prelude::*;
use tally_core::schema::{column, TableBuilder};
use tally_database::{Database, DatabaseAdapter, Error, MemoryAdapter, Row, TransactionMode, Value};
use tally_query::ast::{col, SortOrder};
use tally_query::planner::FindOptions;

#[derive(Clone, Debug)]
enum Op {
    Insert(i64, i64, Option<u8>),
    Update(i64, i64),
    Delete(i64),
    DeleteBucket(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0i64..30, 0i64..6, prop::option::of(0u8..4)).prop_map(|(id, b, t)| Op::Insert(id, b, t)),
        3 => (0i64..30, 0i64..6).prop_map(|(id, b)| Op::Update(id, b)),
        1 => (0i64..30).prop_map(Op::Delete),
        1 => (0i64..6).prop_map(Op::DeleteBucket),
    ]
}

fn open() -> Database<MemoryAdapter> {
    let mut db = Database::new(MemoryAdapter::new());
    db.open("props", 1, |tx, _, _| {
        tx.create_table(
            TableBuilder::new("items")
                .column(column("id").int64().primary_key())
                .column(column("bucket").int64().indexed())
                .column(column("tag").string().unique().nullable())
                .build()?,
        )?;
        Ok(())
    })
    .unwrap();
    db.with_transaction(&["items"], TransactionMode::ReadWrite, |tx| {
        let items = tx.table("items")?;
        for id in 0..10i64 {
            items.insert(Row::new().with("id", id).with("bucket", id % 3))?;
        }
        Ok(())
    })
    .unwrap();
    db
}

fn apply(db: &Database<MemoryAdapter>, ops: &[Op], fail: bool) {
    let _ = db.with_transaction(&["items"], TransactionMode::ReadWrite, |tx| {
        let items = tx.table("items")?;
        for op in ops {
            // Individual failures are part of the workload
            let _ = match op {
                Op::Insert(id, bucket, tag) => {
                    let mut row = Row::new().with("id", *id).with("bucket", *bucket);
                    if let Some(tag) = tag {
                        row = row.with("tag", format!("t{}", tag));
                    }
                    items.insert(row).map(|_| ())
                }
                Op::Update(id, bucket) => items
                    .update(Some(&col("id").equals(*id)), &Row::new().with("bucket", *bucket))
                    .map(|_| ()),
                Op::Delete(id) => items.delete(Some(&col("id").equals(*id))).map(|_| ()),
                Op::DeleteBucket(bucket) => items
                    .delete(Some(&col("bucket").equals(*bucket)))
                    .map(|_| ()),
            };
        }
        if fail {
            return Err(Error::invalid_operation("abort"));
        }
        Ok(())
    });
}

fn contents(db: &Database<MemoryAdapter>) -> Vec<(Value, Value, Value)> {
    db.with_transaction(&["items"], TransactionMode::ReadOnly, |tx| {
        let rows = tx.table("items")?.find_many(&FindOptions::new())?;
        Ok(rows
            .iter()
            .map(|r| (r.value("id").clone(), r.value("bucket").clone(), r.value("tag").clone()))
            .collect())
    })
    .unwrap()
}

proptest! {
    /// A failed transaction leaves rows and indexes as they were.
    #[test]
    fn failed_transaction_is_invisible(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let db = open();
        let before = contents(&db);
        apply(&db, &ops, true);
        prop_assert_eq!(contents(&db), before);
        prop_assert!(!db.adapter().in_transaction());
    }

    /// After a committed transaction, index order agrees with the rows.
    #[test]
    fn committed_index_matches_rows(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let db = open();
        apply(&db, &ops, false);
        let mut expected: Vec<(Value, Value)> = contents(&db)
            .into_iter()
            .map(|(id, bucket, _)| (bucket, id))
            .collect();
        expected.sort();

        let by_bucket = db
            .with_transaction(&["items"], TransactionMode::ReadOnly, |tx| {
                tx.table("items")?
                    .find_many(&FindOptions::new().order_by("bucket", SortOrder::Asc))
            })
            .unwrap();
        let buckets: Vec<Value> = by_bucket.iter().map(|r| r.value("bucket").clone()).collect();
        let expected_buckets: Vec<Value> = expected.iter().map(|(b, _)| b.clone()).collect();
        prop_assert_eq!(buckets, expected_buckets);
    }
}
