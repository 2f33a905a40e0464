use super::{StoreError, UnitOfWork, User, UserId, UserStore};
use async_trait::async_trait;
use sqlx::{Connection, PgPool, Postgres, Transaction};
use tracing::{Instrument, info_span};

const SELECT_USER: &str = r"
    SELECT
        id,
        email,
        username,
        first_name,
        last_name,
        hashed_password,
        is_active,
        role,
        phone_number
    FROM users
    WHERE id = $1
    LIMIT 1
";

const UPDATE_USER: &str = r"
    UPDATE users
    SET
        hashed_password = $1,
        phone_number = $2
    WHERE id = $3
";

/// `users` table access over a Postgres pool.
#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let span = info_span!("db.begin", db.system = "postgresql", db.operation = "BEGIN");
        let tx = self.pool.begin().instrument(span).await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        async {
            let mut conn = self.pool.acquire().await?;
            conn.ping().await?;
            Ok::<(), StoreError>(())
        }
        .instrument(span)
        .await
    }
}

/// A Postgres transaction; rolled back by sqlx when dropped uncommitted.
struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_by_id(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        let span = info_span!("db.query", db.system = "postgresql", db.operation = "SELECT");
        let user = sqlx::query_as::<_, User>(SELECT_USER)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .instrument(span)
            .await?;
        Ok(user)
    }

    async fn save(&mut self, user: &User) -> Result<(), StoreError> {
        let span = info_span!("db.query", db.system = "postgresql", db.operation = "UPDATE");
        sqlx::query(UPDATE_USER)
            .bind(&user.hashed_password)
            .bind(&user.phone_number)
            .bind(user.id)
            .execute(&mut *self.tx)
            .instrument(span)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
