mod common;

use common::{widget_repo, CountWidgets, InsertWidget};
use magrathea_core::{
    open_db_in_memory, Migration, OpenOptions, Repository, SqlCommand, SqlScalar,
    SqliteRepository, UnitOfWorkError,
};
use std::error::Error;

const DEFERRED_FK_MIGRATIONS: &[Migration] = &[Migration::new(
    1,
    "CREATE TABLE parents (id INTEGER PRIMARY KEY);
     CREATE TABLE children (
         id INTEGER PRIMARY KEY,
         parent_id INTEGER NOT NULL
             REFERENCES parents (id) DEFERRABLE INITIALLY DEFERRED
     );",
)];

fn deferred_fk_repo() -> SqliteRepository {
    let ctx = open_db_in_memory(&OpenOptions::with_migrations(DEFERRED_FK_MIGRATIONS)).unwrap();
    SqliteRepository::try_new_requiring(ctx, &["parents", "children"]).unwrap()
}

fn insert_child(id: i64, parent_id: i64) -> SqlCommand {
    SqlCommand::new("INSERT INTO children (id, parent_id) VALUES (?1, ?2);")
        .bind(id)
        .bind(parent_id)
}

fn child_count(repo: &SqliteRepository) -> i64 {
    repo.find_scalar(&SqlScalar::<i64>::new("SELECT COUNT(*) FROM children;"))
        .unwrap()
}

#[test]
fn failed_commit_in_transact_rolls_back_and_releases_the_context() {
    let repo = deferred_fk_repo();

    let result = repo
        .context()
        .transact(|| -> Result<(), Box<dyn Error>> {
            repo.execute(&insert_child(1, 99))?;
            Ok(())
        });

    let err = result.unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
    assert!(!repo.context().is_active());
    assert_eq!(child_count(&repo), 0);

    repo.context().begin().unwrap();
    repo.execute(&SqlCommand::new("INSERT INTO parents (id) VALUES (1);"))
        .unwrap();
    repo.execute(&insert_child(1, 1)).unwrap();
    repo.context().commit().unwrap();
    assert_eq!(child_count(&repo), 1);
}

#[test]
fn transaction_begun_through_a_command_is_not_counted() {
    let repo = widget_repo();
    for id in 1..=5 {
        repo.execute(&InsertWidget::new(id, "seed")).unwrap();
    }

    repo.execute(&SqlCommand::new("BEGIN;")).unwrap();
    repo.execute(&InsertWidget::new(6, "inside")).unwrap();

    assert!(repo.context().is_active());
    assert!(matches!(
        repo.context().pending_changes(),
        Err(UnitOfWorkError::Untracked)
    ));

    repo.context().commit().unwrap();
    assert_eq!(repo.find_scalar(&CountWidgets).unwrap(), 6);
}

#[test]
fn commit_issued_as_a_command_does_not_taint_the_next_unit_of_work() {
    let repo = widget_repo();
    let uow = repo.context();

    uow.begin().unwrap();
    repo.execute(&InsertWidget::new(1, "a")).unwrap();
    repo.execute(&SqlCommand::new("COMMIT;")).unwrap();
    assert!(!uow.is_active());
    assert_eq!(uow.pending_changes().unwrap(), 0);

    for id in 2..=4 {
        repo.execute(&InsertWidget::new(id, "between")).unwrap();
    }

    repo.execute(&SqlCommand::new("BEGIN;")).unwrap();
    repo.execute(&InsertWidget::new(5, "foreign")).unwrap();
    assert!(matches!(
        uow.pending_changes(),
        Err(UnitOfWorkError::Untracked)
    ));
    uow.rollback().unwrap();

    uow.begin().unwrap();
    repo.execute(&InsertWidget::new(6, "tracked")).unwrap();
    assert_eq!(uow.pending_changes().unwrap(), 1);
    uow.commit().unwrap();
    assert_eq!(repo.find_scalar(&CountWidgets).unwrap(), 5);
}
