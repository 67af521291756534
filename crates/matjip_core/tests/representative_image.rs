use matjip_core::db::{open_db, open_db_in_memory, DbError};
use matjip_core::repo::image_repo::{RestaurantImageRepository, SqliteRestaurantImageRepository};
use matjip_core::repo::restaurant_repo::{RestaurantRepository, SqliteRestaurantRepository};
use matjip_core::{ImageRef, RepoError, Restaurant, RestaurantImage};
use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn seed_restaurant(conn: &Connection, name: &str) -> i64 {
    SqliteRestaurantRepository::try_new(conn)
        .unwrap()
        .create_restaurant(&Restaurant::new(name, "서울", "+8225551234"))
        .unwrap()
}

fn image(restaurant_id: i64, path: &str) -> RestaurantImage {
    RestaurantImage::new(restaurant_id, ImageRef::new(path))
}

#[test]
fn second_representative_image_is_rejected_on_checked_path() {
    let conn = open_db_in_memory().unwrap();
    let restaurant_id = seed_restaurant(&conn, "본스테이크");
    let repo = SqliteRestaurantImageRepository::try_new(&conn).unwrap();

    let first = repo
        .save_image_checked(&image(restaurant_id, "restaurant/a.png").representative())
        .unwrap();

    let err = repo
        .save_image_checked(&image(restaurant_id, "restaurant/b.png").representative())
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::RepresentativeImageConflict { restaurant_id: id } if id == restaurant_id
    ));

    let images = repo.list_images(restaurant_id).unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].id, Some(first));
    assert_eq!(
        repo.representative_image(restaurant_id).unwrap().unwrap().id,
        Some(first)
    );
}

#[test]
fn resaving_current_representative_image_succeeds() {
    let conn = open_db_in_memory().unwrap();
    let restaurant_id = seed_restaurant(&conn, "본스테이크");
    let repo = SqliteRestaurantImageRepository::try_new(&conn).unwrap();

    let id = repo
        .save_image_checked(&image(restaurant_id, "restaurant/a.png").representative())
        .unwrap();
    let mut saved = repo.get_image(id).unwrap().unwrap();
    saved.name = Some("외관".to_string());
    saved.display_order = Some(1);

    assert_eq!(repo.save_image_checked(&saved).unwrap(), id);
    let reloaded = repo.get_image(id).unwrap().unwrap();
    assert_eq!(reloaded.name.as_deref(), Some("외관"));
    assert!(reloaded.is_representative);
}

#[test]
fn non_representative_images_are_unrestricted() {
    let conn = open_db_in_memory().unwrap();
    let restaurant_id = seed_restaurant(&conn, "본스테이크");
    let repo = SqliteRestaurantImageRepository::try_new(&conn).unwrap();

    repo.save_image_checked(&image(restaurant_id, "restaurant/a.png").representative())
        .unwrap();
    for path in ["restaurant/b.png", "restaurant/c.png"] {
        repo.save_image_checked(&image(restaurant_id, path)).unwrap();
    }
    assert_eq!(repo.list_images(restaurant_id).unwrap().len(), 3);
}

#[test]
fn rule_is_scoped_per_restaurant() {
    let conn = open_db_in_memory().unwrap();
    let first = seed_restaurant(&conn, "본스테이크");
    let second = seed_restaurant(&conn, "유니크식당");
    let repo = SqliteRestaurantImageRepository::try_new(&conn).unwrap();

    repo.save_image_checked(&image(first, "restaurant/a.png").representative())
        .unwrap();
    repo.save_image_checked(&image(second, "restaurant/b.png").representative())
        .unwrap();
}

#[test]
fn promoting_an_image_after_demoting_the_old_one_succeeds() {
    let conn = open_db_in_memory().unwrap();
    let restaurant_id = seed_restaurant(&conn, "본스테이크");
    let repo = SqliteRestaurantImageRepository::try_new(&conn).unwrap();

    let old_id = repo
        .save_image_checked(&image(restaurant_id, "restaurant/a.png").representative())
        .unwrap();
    let new_id = repo
        .save_image_checked(&image(restaurant_id, "restaurant/b.png"))
        .unwrap();

    let mut promoted = repo.get_image(new_id).unwrap().unwrap();
    promoted.is_representative = true;
    assert!(matches!(
        repo.clean_image(&promoted),
        Err(RepoError::RepresentativeImageConflict { .. })
    ));

    let mut demoted = repo.get_image(old_id).unwrap().unwrap();
    demoted.is_representative = false;
    repo.save_image_checked(&demoted).unwrap();
    repo.save_image_checked(&promoted).unwrap();

    assert_eq!(
        repo.representative_image(restaurant_id).unwrap().unwrap().id,
        Some(new_id)
    );
}

#[test]
fn unchecked_writes_bypass_the_rule() {
    let conn = open_db_in_memory().unwrap();
    let restaurant_id = seed_restaurant(&conn, "본스테이크");
    let repo = SqliteRestaurantImageRepository::try_new(&conn).unwrap();

    let first = repo
        .create_image(&image(restaurant_id, "restaurant/a.png").representative())
        .unwrap();
    repo.create_image(&image(restaurant_id, "restaurant/b.png").representative())
        .unwrap();

    let representatives = repo
        .list_images(restaurant_id)
        .unwrap()
        .into_iter()
        .filter(|image| image.is_representative)
        .count();
    assert_eq!(representatives, 2);
    // Lookup stays deterministic: the oldest representative wins.
    assert_eq!(
        repo.representative_image(restaurant_id).unwrap().unwrap().id,
        Some(first)
    );
}

#[test]
fn gallery_orders_by_display_order_then_id() {
    let conn = open_db_in_memory().unwrap();
    let restaurant_id = seed_restaurant(&conn, "본스테이크");
    let repo = SqliteRestaurantImageRepository::try_new(&conn).unwrap();

    let unordered = repo
        .create_image(&image(restaurant_id, "restaurant/a.png"))
        .unwrap();
    let mut second = image(restaurant_id, "restaurant/b.png");
    second.display_order = Some(2);
    let second = repo.create_image(&second).unwrap();
    let mut first = image(restaurant_id, "restaurant/c.png");
    first.display_order = Some(1);
    let first = repo.create_image(&first).unwrap();

    let ids: Vec<_> = repo
        .list_images(restaurant_id)
        .unwrap()
        .into_iter()
        .filter_map(|image| image.id)
        .collect();
    assert_eq!(ids, vec![first, second, unordered]);
}

#[test]
fn image_for_missing_restaurant_is_a_missing_reference() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRestaurantImageRepository::try_new(&conn).unwrap();

    assert!(matches!(
        repo.save_image_checked(&image(404, "restaurant/a.png")),
        Err(RepoError::MissingReference { .. })
    ));
}

fn representative_rows(conn: &Connection, restaurant_id: i64) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM restaurant_images WHERE restaurant_id = ?1 AND is_representative = 1;",
        [restaurant_id],
        |row| row.get(0),
    )
    .unwrap()
}

fn save_on_own_connection(
    path: &Path,
    restaurant_id: i64,
    file: &'static str,
    start: Arc<Barrier>,
) -> thread::JoinHandle<Result<i64, RepoError>> {
    let conn = open_db(path).unwrap();
    thread::spawn(move || {
        let repo = SqliteRestaurantImageRepository::try_new(&conn).unwrap();
        start.wait();
        repo.save_image_checked(&image(restaurant_id, file).representative())
    })
}

#[test]
fn concurrent_checked_writers_leave_one_representative() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("matjip.sqlite3");
    let conn = open_db(&path).unwrap();
    let restaurant_id = seed_restaurant(&conn, "본스테이크");

    let start = Arc::new(Barrier::new(2));
    let first = save_on_own_connection(&path, restaurant_id, "restaurant/a.png", start.clone());
    let second = save_on_own_connection(&path, restaurant_id, "restaurant/b.png", start);
    let results = [first.join().unwrap(), second.join().unwrap()];

    let saved = results.iter().filter(|result| result.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|result| matches!(result, Err(RepoError::RepresentativeImageConflict { .. })))
        .count();
    assert_eq!((saved, rejected), (1, 1), "{results:?}");
    assert_eq!(representative_rows(&conn, restaurant_id), 1);
}

#[test]
fn checked_writer_waits_for_open_write_transaction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("matjip.sqlite3");
    let holder = open_db(&path).unwrap();
    let restaurant_id = seed_restaurant(&holder, "본스테이크");
    let waiter = open_db(&path).unwrap();

    holder.execute_batch("BEGIN IMMEDIATE;").unwrap();
    SqliteRestaurantImageRepository::try_new(&holder)
        .unwrap()
        .create_image(&image(restaurant_id, "restaurant/a.png").representative())
        .unwrap();

    let pending = thread::spawn(move || {
        SqliteRestaurantImageRepository::try_new(&waiter)
            .unwrap()
            .save_image_checked(&image(restaurant_id, "restaurant/b.png").representative())
    });
    thread::sleep(Duration::from_millis(200));
    assert!(!pending.is_finished());
    holder.execute_batch("COMMIT;").unwrap();

    assert!(matches!(
        pending.join().unwrap(),
        Err(RepoError::RepresentativeImageConflict { restaurant_id: id }) if id == restaurant_id
    ));
    assert_eq!(representative_rows(&holder, restaurant_id), 1);
}

#[test]
fn checked_writer_fails_busy_when_lock_is_held_past_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("matjip.sqlite3");
    let holder = open_db(&path).unwrap();
    let restaurant_id = seed_restaurant(&holder, "본스테이크");
    let waiter = open_db(&path).unwrap();
    waiter.busy_timeout(Duration::from_millis(50)).unwrap();

    holder.execute_batch("BEGIN IMMEDIATE;").unwrap();
    SqliteRestaurantImageRepository::try_new(&holder)
        .unwrap()
        .create_image(&image(restaurant_id, "restaurant/a.png").representative())
        .unwrap();

    let err = SqliteRestaurantImageRepository::try_new(&waiter)
        .unwrap()
        .save_image_checked(&image(restaurant_id, "restaurant/b.png").representative())
        .unwrap_err();
    assert!(
        matches!(
            &err,
            RepoError::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(failure, _)))
                if failure.code == ErrorCode::DatabaseBusy
        ),
        "{err:?}"
    );
    assert!(waiter.is_autocommit());

    holder.execute_batch("COMMIT;").unwrap();
    assert_eq!(representative_rows(&waiter, restaurant_id), 1);
}
