use sqlx::{Pool, Postgres};

mod user;
pub use user::UserExt;

mod role;
pub use role::RoleExt;

mod book;
pub use book::BookExt;

mod review;
pub use review::ReviewExt;

#[derive(Debug, Clone)]
pub struct DBClient {
    pool: Pool<Postgres>,
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}
