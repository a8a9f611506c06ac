use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{MarketStore, StoreError};
use crate::{
    auth::repo_types::{Account, EligibilityProfile, NewAccount, NewEligibility},
    loads::repo_types::{Load, LoadFilter, LoadRow, NewLoad},
    offers::repo_types::{NewOffer, Offer, RankedOffer, RankedOfferRow},
};

const ACCOUNT_COLUMNS: &str = "id, name, email, phone, password_hash, role, created_at";

const LOAD_COLUMNS: &str = r#"
    id, shipper_id, origin, destination, payment, load_length, load_weight, equipment,
    pickup_from, pickup_to, distance, commodity, additional_info,
    contact_name, contact_phone, contact_email, status, trucker_id, created_at
"#;

const OFFER_COLUMNS: &str = "id, load_id, trucker_id, price, status, created_at";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Connects and applies pending migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;
        Ok(Self::new(db))
    }
}

/// Maps unique-constraint violations to [`StoreError::Duplicate`].
fn unique_as(what: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return StoreError::Duplicate(what);
            }
        }
        StoreError::Database(e)
    }
}

/// Escapes `%`, `_` and `\` so user input matches literally inside `ILIKE`.
fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[async_trait]
impl MarketStore for PgStore {
    async fn create_account(
        &self,
        account: NewAccount,
        eligibility: Option<NewEligibility>,
    ) -> Result<Account, StoreError> {
        let mut tx = self.db.begin().await?;

        let created = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (id, name, email, phone, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.phone)
        .bind(&account.password_hash)
        .bind(account.role)
        .fetch_one(&mut *tx)
        .await
        .map_err(unique_as("email"))?;

        if let Some(e) = eligibility {
            sqlx::query(
                r#"
                INSERT INTO eligibility_profiles
                    (trucker_id, has_accident_history, has_theft_complaint_history,
                     truck_manufacture_date, license_issue_date, notes)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(created.id)
            .bind(e.has_accident_history)
            .bind(e.has_theft_complaint_history)
            .bind(e.truck_manufacture_date)
            .bind(e.license_issue_date)
            .bind(&e.notes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn find_eligibility(
        &self,
        trucker_id: Uuid,
    ) -> Result<Option<EligibilityProfile>, StoreError> {
        let profile = sqlx::query_as::<_, EligibilityProfile>(
            r#"
            SELECT trucker_id, has_accident_history, has_theft_complaint_history,
                   truck_manufacture_date, license_issue_date, notes, created_at
              FROM eligibility_profiles
             WHERE trucker_id = $1
            "#,
        )
        .bind(trucker_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(profile)
    }

    async fn insert_load(&self, load: NewLoad) -> Result<Load, StoreError> {
        let row = sqlx::query_as::<_, LoadRow>(&format!(
            r#"
            INSERT INTO loads
                (id, shipper_id, origin, destination, payment, load_length, load_weight,
                 equipment, pickup_from, pickup_to, distance, commodity, additional_info,
                 contact_name, contact_phone, contact_email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {LOAD_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(load.shipper_id)
        .bind(&load.origin)
        .bind(&load.destination)
        .bind(load.payment)
        .bind(load.load_length)
        .bind(load.load_weight)
        .bind(load.equipment)
        .bind(load.pickup_from)
        .bind(load.pickup_to)
        .bind(load.distance)
        .bind(&load.commodity)
        .bind(&load.additional_info)
        .bind(&load.contact.name)
        .bind(&load.contact.phone)
        .bind(&load.contact.email)
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    async fn find_load(&self, id: Uuid) -> Result<Option<Load>, StoreError> {
        let row = sqlx::query_as::<_, LoadRow>(&format!(
            "SELECT {LOAD_COLUMNS} FROM loads WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Load::from))
    }

    async fn loads_by_shipper(&self, shipper_id: Uuid) -> Result<Vec<Load>, StoreError> {
        let rows = sqlx::query_as::<_, LoadRow>(&format!(
            "SELECT {LOAD_COLUMNS} FROM loads WHERE shipper_id = $1 ORDER BY created_at ASC"
        ))
        .bind(shipper_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Load::from).collect())
    }

    async fn pending_loads(&self, filter: &LoadFilter) -> Result<Vec<Load>, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {LOAD_COLUMNS} FROM loads WHERE status = 'pending'"
        ));
        if let Some(origin) = &filter.origin {
            qb.push(" AND origin ILIKE ").push_bind(like_pattern(origin));
        }
        if let Some(destination) = &filter.destination {
            qb.push(" AND destination ILIKE ").push_bind(like_pattern(destination));
        }
        if let Some(equipment) = filter.equipment {
            qb.push(" AND equipment = ").push_bind(equipment);
        }
        if let Some(from) = filter.pickup_from {
            qb.push(" AND pickup_from >= ").push_bind(from);
        }
        if let Some(to) = filter.pickup_to {
            qb.push(" AND pickup_to <= ").push_bind(to);
        }
        qb.push(" ORDER BY created_at ASC");

        let rows = qb.build_query_as::<LoadRow>().fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(Load::from).collect())
    }

    async fn update_pending_load(&self, load: &Load) -> Result<Option<Load>, StoreError> {
        let row = sqlx::query_as::<_, LoadRow>(&format!(
            r#"
            UPDATE loads
               SET origin = $3, destination = $4, payment = $5, load_length = $6,
                   load_weight = $7, equipment = $8, pickup_from = $9, pickup_to = $10,
                   distance = $11, commodity = $12, additional_info = $13,
                   contact_name = $14, contact_phone = $15, contact_email = $16
             WHERE id = $1 AND shipper_id = $2 AND status = 'pending'
            RETURNING {LOAD_COLUMNS}
            "#
        ))
        .bind(load.id)
        .bind(load.shipper_id)
        .bind(&load.origin)
        .bind(&load.destination)
        .bind(load.payment)
        .bind(load.load_length)
        .bind(load.load_weight)
        .bind(load.equipment)
        .bind(load.pickup_from)
        .bind(load.pickup_to)
        .bind(load.distance)
        .bind(&load.commodity)
        .bind(&load.additional_info)
        .bind(&load.contact.name)
        .bind(&load.contact.phone)
        .bind(&load.contact.email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Load::from))
    }

    async fn delete_pending_load(
        &self,
        shipper_id: Uuid,
        load_id: Uuid,
    ) -> Result<Option<Load>, StoreError> {
        let mut tx = self.db.begin().await?;

        let Some(row) = sqlx::query_as::<_, LoadRow>(&format!(
            r#"
            DELETE FROM loads
             WHERE id = $1 AND shipper_id = $2 AND status = 'pending'
            RETURNING {LOAD_COLUMNS}
            "#
        ))
        .bind(load_id)
        .bind(shipper_id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE offers SET status = 'rejected' WHERE load_id = $1")
            .bind(load_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(row.into()))
    }

    async fn book_load(&self, load_id: Uuid, trucker_id: Uuid) -> Result<Option<Load>, StoreError> {
        let mut tx = self.db.begin().await?;

        let has_offer: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM offers WHERE load_id = $1 AND trucker_id = $2)",
        )
        .bind(load_id)
        .bind(trucker_id)
        .fetch_one(&mut *tx)
        .await?;
        if !has_offer {
            tx.rollback().await?;
            return Ok(None);
        }

        let Some(row) = sqlx::query_as::<_, LoadRow>(&format!(
            r#"
            UPDATE loads
               SET status = 'booked', trucker_id = $2
             WHERE id = $1 AND status = 'pending'
            RETURNING {LOAD_COLUMNS}
            "#
        ))
        .bind(load_id)
        .bind(trucker_id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE offers
               SET status = CASE WHEN trucker_id = $2
                                 THEN 'accepted'::offer_status
                                 ELSE 'rejected'::offer_status END
             WHERE load_id = $1
            "#,
        )
        .bind(load_id)
        .bind(trucker_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(row.into()))
    }

    async fn insert_offer(&self, offer: NewOffer) -> Result<Offer, StoreError> {
        let created = sqlx::query_as::<_, Offer>(&format!(
            r#"
            INSERT INTO offers (id, load_id, trucker_id, price)
            VALUES ($1, $2, $3, $4)
            RETURNING {OFFER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(offer.load_id)
        .bind(offer.trucker_id)
        .bind(offer.price)
        .fetch_one(&self.db)
        .await
        .map_err(unique_as("offer"))?;
        Ok(created)
    }

    async fn find_offer(
        &self,
        load_id: Uuid,
        trucker_id: Uuid,
    ) -> Result<Option<Offer>, StoreError> {
        let offer = sqlx::query_as::<_, Offer>(&format!(
            "SELECT {OFFER_COLUMNS} FROM offers WHERE load_id = $1 AND trucker_id = $2"
        ))
        .bind(load_id)
        .bind(trucker_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(offer)
    }

    async fn offers_for_load(&self, load_id: Uuid) -> Result<Vec<RankedOffer>, StoreError> {
        let rows = sqlx::query_as::<_, RankedOfferRow>(
            r#"
            SELECT o.id, o.load_id, o.trucker_id, o.price, o.status, o.created_at,
                   a.name AS trucker_name, a.phone AS trucker_phone, a.email AS trucker_email
              FROM offers o
              JOIN accounts a ON a.id = o.trucker_id
             WHERE o.load_id = $1
             ORDER BY o.price ASC, o.created_at ASC, o.id ASC
            "#,
        )
        .bind(load_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(RankedOffer::from).collect())
    }
}
