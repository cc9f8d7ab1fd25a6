//! Backend-agnostic table alteration actions.
//!
//! An [`AlterTableBuilder`] records an ordered list of [`AlterTableAction`]s. Each
//! backend replays the list its own way: the in-memory engine turns them into row
//! rewrites and index rebuilds, while a DDL-emitting backend would render them as
//! statements.

use super::column::{ColumnBuilder, ColumnDefinition};
use crate::types::DataType;
use serde::{Deserialize, Serialize};

/// A single change to one column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnChange {
    SetDataType(DataType),
    SetNullable(bool),
    SetIndexed(bool),
    SetUnique(bool),
}

/// One recorded table alteration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlterTableAction {
    AddColumn(ColumnDefinition),
    AlterColumn { column: String, change: ColumnChange },
    DropColumn { column: String },
    RenameColumn { from: String, to: String },
    RenameTable { to: String },
}

/// Collects the changes requested for one column.
#[derive(Debug, Default)]
pub struct AlterColumn {
    changes: Vec<ColumnChange>,
}

impl AlterColumn {
    pub fn set_data_type(mut self, data_type: DataType) -> Self {
        self.changes.push(ColumnChange::SetDataType(data_type));
        self
    }

    pub fn set_nullable(mut self, nullable: bool) -> Self {
        self.changes.push(ColumnChange::SetNullable(nullable));
        self
    }

    pub fn set_indexed(mut self, indexed: bool) -> Self {
        self.changes.push(ColumnChange::SetIndexed(indexed));
        self
    }

    pub fn set_unique(mut self, unique: bool) -> Self {
        self.changes.push(ColumnChange::SetUnique(unique));
        self
    }
}

/// Records alterations for one table in call order.
#[derive(Debug)]
pub struct AlterTableBuilder {
    table: String,
    actions: Vec<AlterTableAction>,
}

impl AlterTableBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            actions: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn add_column(mut self, column: ColumnBuilder) -> Self {
        self.actions.push(AlterTableAction::AddColumn(column.build()));
        self
    }

    /// Records changes for an existing column:
    /// `.alter_column("age", |c| c.set_indexed(true).set_nullable(true))`.
    pub fn alter_column(
        mut self,
        column: impl Into<String>,
        f: impl FnOnce(AlterColumn) -> AlterColumn,
    ) -> Self {
        let column = column.into();
        let changes = f(AlterColumn::default()).changes;
        self.actions.extend(changes.into_iter().map(|change| AlterTableAction::AlterColumn {
            column: column.clone(),
            change,
        }));
        self
    }

    pub fn drop_column(mut self, column: impl Into<String>) -> Self {
        self.actions.push(AlterTableAction::DropColumn {
            column: column.into(),
        });
        self
    }

    pub fn rename_column(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.actions.push(AlterTableAction::RenameColumn {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    pub fn rename_table(mut self, to: impl Into<String>) -> Self {
        self.actions.push(AlterTableAction::RenameTable { to: to.into() });
        self
    }

    pub fn actions(&self) -> &[AlterTableAction] {
        &self.actions
    }

    pub fn into_actions(self) -> Vec<AlterTableAction> {
        self.actions
    }
}
