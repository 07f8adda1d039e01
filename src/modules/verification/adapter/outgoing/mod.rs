pub mod sea_orm_entity;
pub mod verification_store_postgres;
