use std::sync::Arc;

use async_trait::async_trait;
use seedbank_hydrate::{
    ChildLoader, Database, HydrateResult, Id, Mapped, ParserRef, SqlValue, fetch_objects, sql,
};
use seedbank_security::{ANONYMOUS_SUBJECT_ID, SecurityContext};

/// Builds the bound parameters of a child query from the caller and the
/// parent id.
pub type ParamsFn = fn(&SecurityContext, Id) -> Vec<SqlValue>;

fn parent_only(_ctx: &SecurityContext, parent_id: Id) -> Vec<SqlValue> {
    vec![SqlValue::Int(parent_id)]
}

fn parent_and_user(ctx: &SecurityContext, parent_id: Id) -> Vec<SqlValue> {
    vec![
        SqlValue::Int(parent_id),
        SqlValue::Int(ctx.subject_id().unwrap_or(ANONYMOUS_SUBJECT_ID)),
    ]
}

/// Loads children with one parameterized query, parsed with the root
/// contract: denied or malformed children are left out.
pub struct SqlChildLoader<C: Mapped, D: Database> {
    db: Arc<D>,
    parser: ParserRef<C>,
    sql: String,
    params: ParamsFn,
    eager: bool,
}

impl<C: Mapped, D: Database> SqlChildLoader<C, D> {
    #[must_use]
    pub fn new(db: Arc<D>, parser: ParserRef<C>, sql: String, params: ParamsFn) -> Self {
        Self {
            db,
            parser,
            sql,
            params,
            eager: false,
        }
    }

    /// Children whose `parent_column` equals the parent id.
    #[must_use]
    pub fn by_parent(db: Arc<D>, parser: ParserRef<C>, parent_column: &str) -> Self {
        let sql = format!(
            "SELECT {} FROM {} WHERE {parent_column} = ? ORDER BY {}",
            sql::select_list(C::COLUMNS),
            C::TABLE,
            C::ID_COLUMN,
        );
        Self::new(db, parser, sql, parent_only)
    }

    /// Children of the parent recorded against the calling user. Anonymous
    /// callers are matched as [`ANONYMOUS_SUBJECT_ID`].
    #[must_use]
    pub fn by_parent_and_user(
        db: Arc<D>,
        parser: ParserRef<C>,
        parent_column: &str,
        user_column: &str,
    ) -> Self {
        let sql = format!(
            "SELECT {} FROM {} WHERE {parent_column} = ? AND {user_column} = ? ORDER BY {}",
            sql::select_list(C::COLUMNS),
            C::TABLE,
            C::ID_COLUMN,
        );
        Self::new(db, parser, sql, parent_and_user)
    }

    /// Parse references out of the joined columns of the child query.
    #[must_use]
    pub fn eager(mut self) -> Self {
        self.eager = true;
        self
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

#[async_trait]
impl<C, D> ChildLoader<C> for SqlChildLoader<C, D>
where
    C: Mapped,
    D: Database + 'static,
{
    async fn load(&self, ctx: &SecurityContext, parent_id: Id) -> HydrateResult<Vec<C>> {
        let params = (self.params)(ctx, parent_id);
        fetch_objects(
            &*self.db,
            &*self.parser,
            &self.sql,
            params,
            ctx,
            self.eager,
        )
        .await
    }
}
