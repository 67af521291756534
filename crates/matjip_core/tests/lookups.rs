use matjip_core::db::open_db_in_memory;
use matjip_core::repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
use matjip_core::repo::region_repo::{RegionRepository, SqliteRegionRepository};
use matjip_core::repo::restaurant_repo::{RestaurantRepository, SqliteRestaurantRepository};
use matjip_core::repo::review_repo::{ReviewRepository, SqliteReviewRepository};
use matjip_core::{
    CuisineType, FieldErrorKind, Region, RepoError, Restaurant, RestaurantCategory, Review,
    SocialChannel, Tag,
};

#[test]
fn duplicate_region_triple_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRegionRepository::try_new(&conn).unwrap();

    let id = repo
        .create_region(&Region::new("서울", "강남구", "역삼동"))
        .unwrap();
    let err = repo
        .create_region(&Region::new("서울", "강남구", "역삼동"))
        .unwrap_err();
    assert!(matches!(err, RepoError::Unique { entity: "region", .. }));

    // Sharing two of three levels is fine.
    repo.create_region(&Region::new("서울", "강남구", "삼성동"))
        .unwrap();

    let found = repo.find_region("서울", "강남구", "역삼동").unwrap().unwrap();
    assert_eq!(found.id, Some(id));
    assert_eq!(found.to_string(), "서울 강남구 역삼동");
    assert_eq!(repo.list_regions(Some("서울")).unwrap().len(), 2);
    assert!(repo.list_regions(Some("부산")).unwrap().is_empty());
}

#[test]
fn region_update_into_existing_triple_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRegionRepository::try_new(&conn).unwrap();

    repo.create_region(&Region::new("서울", "강남구", "역삼동"))
        .unwrap();
    let other = repo
        .create_region(&Region::new("서울", "강남구", "삼성동"))
        .unwrap();

    let mut moved = repo.get_region(other).unwrap().unwrap();
    moved.eupmyeondong = "역삼동".to_string();
    assert!(matches!(
        repo.update_region(&moved),
        Err(RepoError::Unique { .. })
    ));
}

#[test]
fn region_parts_are_length_checked() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRegionRepository::try_new(&conn).unwrap();

    let long = "가".repeat(21);
    match repo.create_region(&Region::new("서울", long, "역삼동")) {
        Err(RepoError::Validation(err)) => assert_eq!(
            err.field("sigungu"),
            Some(&FieldErrorKind::MaxLength {
                max: 20,
                actual: 21
            })
        ),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn deleting_region_nullifies_restaurants() {
    let conn = open_db_in_memory().unwrap();
    let regions = SqliteRegionRepository::try_new(&conn).unwrap();
    let restaurants = SqliteRestaurantRepository::try_new(&conn).unwrap();

    let region_id = regions
        .create_region(&Region::new("서울", "강남구", "역삼동"))
        .unwrap();
    let mut restaurant = Restaurant::new("본스테이크", "서울 강남구 역삼동", "+8225551234");
    restaurant.region_id = Some(region_id);
    let restaurant_id = restaurants.create_restaurant(&restaurant).unwrap();

    let in_region = regions.restaurants_in_region(region_id).unwrap();
    assert_eq!(in_region.len(), 1);
    assert_eq!(in_region[0].id, Some(restaurant_id));

    regions.delete_region(region_id).unwrap();

    let survivor = restaurants.get_restaurant(restaurant_id).unwrap().unwrap();
    assert_eq!(survivor.region_id, None);
    assert!(matches!(
        regions.delete_region(region_id),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn tag_names_are_unique() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();

    let id = repo.create_tag(&Tag::new("가성비")).unwrap();
    assert!(matches!(
        repo.create_tag(&Tag::new("가성비")),
        Err(RepoError::Unique { entity: "tag", .. })
    ));

    let existing = repo.get_or_create_tag("가성비").unwrap();
    assert_eq!(existing.id, Some(id));
    assert_eq!(repo.list_tags().unwrap().len(), 1);

    let renamed_target = repo.create_tag(&Tag::new("분위기")).unwrap();
    let mut renamed = repo.get_tag(renamed_target).unwrap().unwrap();
    renamed.name = "가성비".to_string();
    assert!(matches!(
        repo.update_tag(&renamed),
        Err(RepoError::Unique { .. })
    ));
}

#[test]
fn blank_tag_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();

    match repo.create_tag(&Tag::new("  ")) {
        Err(RepoError::Validation(err)) => {
            assert_eq!(err.field("name"), Some(&FieldErrorKind::Required))
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn deleting_cuisine_type_cascades_to_categories_and_nullifies_restaurants() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalogRepository::try_new(&conn).unwrap();
    let restaurants = SqliteRestaurantRepository::try_new(&conn).unwrap();

    let korean = catalog.create_cuisine_type(&CuisineType::new("한식")).unwrap();
    let western = catalog.create_cuisine_type(&CuisineType::new("양식")).unwrap();
    let gukbap = catalog
        .create_category(&RestaurantCategory::new("국밥", Some(korean)))
        .unwrap();
    let steak = catalog
        .create_category(&RestaurantCategory::new("스테이크", Some(western)))
        .unwrap();

    assert_eq!(catalog.list_categories(Some(korean)).unwrap().len(), 1);
    assert_eq!(catalog.list_categories(None).unwrap().len(), 2);

    let mut restaurant = Restaurant::new("돼지국밥", "부산", "+82515550000");
    restaurant.category_id = Some(gukbap);
    let restaurant_id = restaurants.create_restaurant(&restaurant).unwrap();

    catalog.delete_cuisine_type(korean).unwrap();

    assert!(catalog.get_category(gukbap).unwrap().is_none());
    assert!(catalog.get_category(steak).unwrap().is_some());
    let survivor = restaurants.get_restaurant(restaurant_id).unwrap().unwrap();
    assert_eq!(survivor.category_id, None);
}

#[test]
fn deleting_category_nullifies_restaurants() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalogRepository::try_new(&conn).unwrap();
    let restaurants = SqliteRestaurantRepository::try_new(&conn).unwrap();

    let category = catalog
        .create_category(&RestaurantCategory::new("분식", None))
        .unwrap();
    let mut restaurant = Restaurant::new("떡볶이집", "서울", "+8225550000");
    restaurant.category_id = Some(category);
    let restaurant_id = restaurants.create_restaurant(&restaurant).unwrap();

    catalog.delete_category(category).unwrap();
    assert_eq!(
        restaurants
            .get_restaurant(restaurant_id)
            .unwrap()
            .unwrap()
            .category_id,
        None
    );
}

#[test]
fn deleting_social_channel_nullifies_reviews() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalogRepository::try_new(&conn).unwrap();
    let restaurants = SqliteRestaurantRepository::try_new(&conn).unwrap();
    let reviews = SqliteReviewRepository::try_new(&conn).unwrap();

    let channel = catalog
        .create_social_channel(&SocialChannel::new("Instagram"))
        .unwrap();
    let restaurant_id = restaurants
        .create_restaurant(&Restaurant::new("본스테이크", "서울", "+8225551234"))
        .unwrap();
    let mut review = Review::new(restaurant_id, "맛있어요", "미식가", "육즙 최고", 5);
    review.social_channel_id = Some(channel);
    let review_id = reviews.create_review(&review).unwrap();

    catalog.delete_social_channel(channel).unwrap();

    let survivor = reviews.get_review(review_id).unwrap().unwrap();
    assert_eq!(survivor.social_channel_id, None);
    assert!(catalog.list_social_channels().unwrap().is_empty());
}

#[test]
fn lookup_display_is_the_name() {
    assert_eq!(CuisineType::new("한식").to_string(), "한식");
    assert_eq!(RestaurantCategory::new("국밥", None).to_string(), "국밥");
    assert_eq!(SocialChannel::new("YouTube").to_string(), "YouTube");
    assert_eq!(Tag::new("노포").to_string(), "노포");
}
