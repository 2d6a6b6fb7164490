use async_trait::async_trait;
use sea_orm::sea_query::{Expr, NullOrdering};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, Condition, EntityTrait, IntoActiveModel,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use storekit_query::{Fields, Filter, Operand, QueryDescriptor, SortDir, Value};
use tracing::debug;

use super::field::{FieldMap, coerce};
use super::{RelationalSession, SeaOrmRunner};
use crate::adapter::{Backend, BackendAdapter};
use crate::identity::IntegerId;
use crate::{DbError, Result};

/// Run `$body` with `$c` bound to whichever executor the session holds.
macro_rules! with_runner {
    ($session:expr, |$c:ident| $body:expr) => {
        match $session.runner() {
            SeaOrmRunner::Conn($c) => $body,
            SeaOrmRunner::Tx($c) => $body,
        }
    };
}

/// `SeaORM` adapter for one entity.
///
/// Only fields present in the [`FieldMap`] can be filtered, sorted or
/// written. The entity's primary key must be an integer column named `id`.
pub struct RelationalAdapter<E: EntityTrait> {
    name: String,
    fields: FieldMap<E>,
}

impl<E: EntityTrait> Clone for RelationalAdapter<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            fields: self.fields.clone(),
        }
    }
}

impl<E: EntityTrait> RelationalAdapter<E> {
    pub fn new(name: impl Into<String>, fields: FieldMap<E>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    #[must_use]
    pub fn fields(&self) -> &FieldMap<E> {
        &self.fields
    }

    fn predicate(&self, field: &str, operand: &Operand) -> Result<Condition> {
        let f = self.fields.require(field)?;
        let cond = match operand {
            Operand::Eq(Value::Null) => Condition::all().add(Expr::col(f.col).is_null()),
            Operand::Eq(v) => Condition::all().add(Expr::col(f.col).eq(coerce(field, f.kind, v)?)),
            Operand::In(vs) => {
                let has_null = vs.iter().any(Value::is_null);
                let values = vs
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| coerce(field, f.kind, v))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                // An empty list matches nothing.
                let mut any = Condition::any();
                if !values.is_empty() || !has_null {
                    any = any.add(Expr::col(f.col).is_in(values));
                }
                if has_null {
                    any = any.add(Expr::col(f.col).is_null());
                }
                any
            }
        };
        Ok(cond)
    }

    fn condition(&self, filters: &[Filter]) -> Result<Condition> {
        filters.iter().try_fold(Condition::all(), |cond, f| {
            Ok(cond.add(self.predicate(&f.field, &f.operand)?))
        })
    }

    fn single(&self, mut rows: Vec<E::Model>) -> Result<E::Model> {
        match rows.len() {
            0 => Err(DbError::not_found(&self.name)),
            1 => rows.pop().ok_or_else(|| DbError::not_found(&self.name)),
            count => Err(DbError::MultipleResults {
                entity: self.name.clone(),
                count,
            }),
        }
    }
}

#[async_trait]
impl<E> BackendAdapter for RelationalAdapter<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
{
    type Session = RelationalSession;
    type Record = E::Model;
    type Identity = IntegerId;

    const BACKEND: Backend = Backend::Relational;

    fn entity_name(&self) -> &str {
        &self.name
    }

    fn is_declared(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    async fn get(&self, session: &mut RelationalSession, field: &str, value: Value) -> Result<E::Model> {
        let cond = self.predicate(field, &Operand::Eq(value))?;
        debug!(entity = %self.name, field, "get");
        let rows = with_runner!(session, |c| E::find().filter(cond).limit(2).all(c).await?);
        self.single(rows)
    }

    async fn get_by_attributes(&self, session: &mut RelationalSession, filters: &[Filter]) -> Result<E::Model> {
        let cond = self.condition(filters)?;
        debug!(entity = %self.name, ?filters, "get_by_attributes");
        let rows = with_runner!(session, |c| E::find().filter(cond).limit(2).all(c).await?);
        self.single(rows)
    }

    async fn get_list(
        &self,
        session: &mut RelationalSession,
        field: &str,
        operand: Operand,
    ) -> Result<Vec<E::Model>> {
        let cond = self.predicate(field, &operand)?;
        debug!(entity = %self.name, field, ?operand, "get_list");
        Ok(with_runner!(session, |c| E::find().filter(cond).all(c).await?))
    }

    async fn count(&self, session: &mut RelationalSession, filters: &[Filter]) -> Result<u64> {
        let cond = self.condition(filters)?;
        Ok(with_runner!(session, |c| E::find().filter(cond).count(c).await?))
    }

    async fn find_page(
        &self,
        session: &mut RelationalSession,
        query: &QueryDescriptor,
    ) -> Result<Vec<E::Model>> {
        let mut select = E::find().filter(self.condition(query.filters())?);

        let implicit_sort = query.sorting().is_empty();
        for key in query.effective_sorting().iter() {
            let Some(f) = self.fields.get(&key.field) else {
                if implicit_sort {
                    continue;
                }
                return Err(storekit_query::Error::UnknownField(key.field.clone()).into());
            };
            // NULL sorts as the smallest value on every engine.
            select = match key.dir {
                SortDir::Asc => select.order_by_with_nulls(f.col, Order::Asc, NullOrdering::First),
                SortDir::Desc => select.order_by_with_nulls(f.col, Order::Desc, NullOrdering::Last),
            };
        }

        let page = query.pagination();
        debug!(
            entity = %self.name,
            filters = query.filters().len(),
            limit = page.limit(),
            offset = page.offset(),
            "find_page"
        );

        let select = select.limit(page.limit()).offset(page.offset());
        Ok(with_runner!(session, |c| select.all(c).await?))
    }

    async fn create(&self, session: &mut RelationalSession, fields: Fields) -> Result<E::Model> {
        let mut am = <E::ActiveModel as ActiveModelTrait>::default();
        for (name, v) in &fields {
            let Some(f) = self.fields.get(name) else {
                debug!(entity = %self.name, field = %name, "skipping undeclared field");
                continue;
            };
            am.try_set(f.col, coerce(name, f.kind, v)?)?;
        }
        debug!(entity = %self.name, "create");
        Ok(with_runner!(session, |c| am.insert(c).await?))
    }

    async fn update(
        &self,
        session: &mut RelationalSession,
        field: &str,
        value: Value,
        changes: Fields,
    ) -> Result<u64> {
        let cond = self.predicate(field, &Operand::Eq(value))?;

        let mut update = E::update_many().filter(cond.clone());
        let mut touched = 0usize;
        for (name, v) in &changes {
            let Some(f) = self.fields.get(name) else {
                debug!(entity = %self.name, field = %name, "skipping undeclared field");
                continue;
            };
            update = update.col_expr(f.col, Expr::value(coerce(name, f.kind, v)?));
            touched += 1;
        }
        debug!(entity = %self.name, field, columns = touched, "update");

        if touched == 0 {
            return Ok(with_runner!(session, |c| E::find().filter(cond).count(c).await?));
        }
        Ok(with_runner!(session, |c| update.exec(c).await?.rows_affected))
    }

    async fn delete(&self, session: &mut RelationalSession, field: &str, value: Value) -> Result<u64> {
        let cond = self.predicate(field, &Operand::Eq(value))?;
        debug!(entity = %self.name, field, "delete");
        Ok(with_runner!(session, |c| E::delete_many().filter(cond).exec(c).await?.rows_affected))
    }
}
