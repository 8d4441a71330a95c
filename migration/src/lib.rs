pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_draws;
mod m20250901_000002_create_draw_participants;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_draws::Migration),
            Box::new(m20250901_000002_create_draw_participants::Migration),
        ]
    }
}
