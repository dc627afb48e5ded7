//! Create an absent table straight from its plan.

use crate::error::MigrateResult;
use crate::objects::{create_missing, CreatedObjects};
use tm_core::MigrationPlan;
use tm_db::Store;

/// Create the table, its indexes, and its triggers in one transaction.
pub fn bootstrap(store: &Store, plan: &MigrationPlan) -> MigrateResult<CreatedObjects> {
    store.transaction(|conn| {
        let create = plan.create_table_sql(&plan.table);
        log::debug!("{create}");
        conn.execute_batch(&create)?;
        create_missing(conn, plan, &plan.table, None)
    })
}
