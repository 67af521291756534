use matjip_core::db::open_db_in_memory;
use matjip_core::repo::restaurant_repo::{RestaurantRepository, SqliteRestaurantRepository};
use matjip_core::repo::review_repo::{ReviewRepository, SqliteReviewRepository};
use matjip_core::{FieldErrorKind, ImageRef, Page, RepoError, Restaurant, Review, ReviewImage};
use rusqlite::Connection;

fn seed_restaurant(conn: &Connection) -> i64 {
    SqliteRestaurantRepository::try_new(conn)
        .unwrap()
        .create_restaurant(&Restaurant::new("본스테이크", "서울", "+8225551234"))
        .unwrap()
}

#[test]
fn rating_outside_one_to_five_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let restaurant_id = seed_restaurant(&conn);
    let repo = SqliteReviewRepository::try_new(&conn).unwrap();

    match repo.create_review(&Review::new(restaurant_id, "별로", "손님", "짰어요", 0)) {
        Err(RepoError::Validation(err)) => {
            assert_eq!(err.field("rating"), Some(&FieldErrorKind::MinValue { min: 1 }))
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    match repo.create_review(&Review::new(restaurant_id, "최고", "손님", "완벽", 6)) {
        Err(RepoError::Validation(err)) => {
            assert_eq!(err.field("rating"), Some(&FieldErrorKind::MaxValue { max: 5 }))
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    for rating in 1..=5 {
        repo.create_review(&Review::new(restaurant_id, "후기", "손님", "내용", rating))
            .unwrap();
    }
    assert_eq!(repo.list_reviews(restaurant_id, Page::default()).unwrap().len(), 5);
}

#[test]
fn review_crud_and_listing_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let restaurant_id = seed_restaurant(&conn);
    let repo = SqliteReviewRepository::try_new(&conn).unwrap();

    let older = repo
        .create_review(&Review::new(restaurant_id, "첫 방문", "먹보", "좋아요", 4))
        .unwrap();
    let newer = repo
        .create_review(&Review::new(restaurant_id, "재방문", "먹보", "역시", 5))
        .unwrap();
    conn.execute(
        "UPDATE reviews SET created_at = 1000 WHERE id = ?1;",
        [older],
    )
    .unwrap();
    conn.execute(
        "UPDATE reviews SET created_at = 2000 WHERE id = ?1;",
        [newer],
    )
    .unwrap();

    let listed = repo.list_reviews(restaurant_id, Page::default()).unwrap();
    let ids: Vec<_> = listed.iter().filter_map(|review| review.id).collect();
    assert_eq!(ids, vec![newer, older]);
    assert_eq!(listed[0].to_string(), "먹보:재방문");

    let first_page = repo.list_reviews(restaurant_id, Page::new(1, 0)).unwrap();
    assert_eq!(first_page.len(), 1);
    assert_eq!(first_page[0].id, Some(newer));

    let mut edited = repo.get_review(older).unwrap().unwrap();
    edited.rating = 2;
    edited.profile_image = Some(ImageRef::new("review-profile/me.png"));
    repo.update_review(&edited).unwrap();
    let reloaded = repo.get_review(older).unwrap().unwrap();
    assert_eq!(reloaded.rating, 2);
    assert_eq!(
        reloaded.profile_image.as_ref().map(ImageRef::as_str),
        Some("review-profile/me.png")
    );

    repo.delete_review(newer).unwrap();
    assert!(repo.get_review(newer).unwrap().is_none());
}

#[test]
fn review_images_belong_to_their_review() {
    let conn = open_db_in_memory().unwrap();
    let restaurant_id = seed_restaurant(&conn);
    let repo = SqliteReviewRepository::try_new(&conn).unwrap();

    let review_id = repo
        .create_review(&Review::new(restaurant_id, "사진 후기", "먹보", "보세요", 5))
        .unwrap();
    let first = repo
        .create_review_image(&ReviewImage::new(
            review_id,
            "스테이크",
            ImageRef::new("review/a.jpg"),
        ))
        .unwrap();
    repo.create_review_image(&ReviewImage::new(
        review_id,
        "디저트",
        ImageRef::new("review/b.jpg"),
    ))
    .unwrap();

    let images = repo.list_review_images(review_id).unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].id, Some(first));

    let mut renamed = images[0].clone();
    renamed.name = "안심 스테이크".to_string();
    repo.update_review_image(&renamed).unwrap();
    assert_eq!(
        repo.get_review_image(first).unwrap().unwrap().name,
        "안심 스테이크"
    );

    repo.delete_review(review_id).unwrap();
    assert!(repo.list_review_images(review_id).unwrap().is_empty());
}

#[test]
fn review_image_for_missing_review_is_a_missing_reference() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteReviewRepository::try_new(&conn).unwrap();

    assert!(matches!(
        repo.create_review_image(&ReviewImage::new(77, "사진", ImageRef::new("review/x.png"))),
        Err(RepoError::MissingReference { .. })
    ));
}
