use orgdir_core::db::open_db_in_memory;
use orgdir_core::repo::building_repo::BuildingRepoError;
use orgdir_core::{
    ActivityService, BuildingService, BuildingServiceError, BuildingValidationError,
    OrganizationService, SqliteActivityRepository, SqliteBuildingRepository,
    SqliteOrganizationRepository,
};

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

fn building_service(conn: &rusqlite::Connection) -> BuildingService<SqliteBuildingRepository<'_>> {
    BuildingService::new(SqliteBuildingRepository::new(conn))
}

#[test]
fn create_and_reload_roundtrip() {
    let conn = setup();
    let buildings = building_service(&conn);

    let created = buildings
        .create_building("  ул. Ленина, 1  ", 55.7558, 37.6173)
        .unwrap();
    assert!(created.id > 0);
    assert_eq!(created.address, "ул. Ленина, 1");

    let reloaded = buildings.get_building(created.id).unwrap();
    assert_eq!(reloaded, Some(created));
}

#[test]
fn create_rejects_bad_addresses_and_coordinates() {
    let conn = setup();
    let buildings = building_service(&conn);

    let blank = buildings.create_building("   ", 55.0, 37.0).unwrap_err();
    assert!(matches!(
        blank,
        BuildingServiceError::InvalidBuilding(BuildingValidationError::BlankAddress)
    ));

    let high_lat = buildings
        .create_building("ул. Ленина, 1", 100.0, 37.0)
        .unwrap_err();
    assert!(matches!(
        high_lat,
        BuildingServiceError::InvalidBuilding(BuildingValidationError::LatitudeOutOfRange(_))
    ));

    let low_lon = buildings
        .create_building("ул. Ленина, 1", 55.0, -200.0)
        .unwrap_err();
    assert!(matches!(
        low_lon,
        BuildingServiceError::InvalidBuilding(BuildingValidationError::LongitudeOutOfRange(_))
    ));

    let nan_lat = buildings
        .create_building("ул. Ленина, 1", f64::NAN, 37.0)
        .unwrap_err();
    assert!(matches!(
        nan_lat,
        BuildingServiceError::InvalidBuilding(BuildingValidationError::LatitudeOutOfRange(_))
    ));
}

#[test]
fn duplicate_addresses_are_rejected_by_the_store() {
    let conn = setup();
    let buildings = building_service(&conn);

    buildings
        .create_building("ул. Ленина, 1", 55.0, 37.0)
        .unwrap();
    let err = buildings
        .create_building("ул. Ленина, 1", 56.0, 38.0)
        .unwrap_err();
    assert!(matches!(
        err,
        BuildingServiceError::Repo(BuildingRepoError::ConstraintViolation(_))
    ));
}

#[test]
fn coordinate_bounds_are_inclusive() {
    let conn = setup();
    let buildings = building_service(&conn);

    let north_pole = buildings.create_building("Северный полюс", 90.0, 180.0).unwrap();
    assert_eq!(north_pole.latitude, 90.0);

    let south_pole = buildings
        .create_building("Южный полюс", -90.0, -180.0)
        .unwrap();
    assert_eq!(south_pole.longitude, -180.0);
}

#[test]
fn update_merges_partial_fields_before_validation() {
    let conn = setup();
    let buildings = building_service(&conn);

    let created = buildings
        .create_building("ул. Ленина, 1", 55.0, 37.0)
        .unwrap();

    let moved = buildings
        .update_building(created.id, None, Some(60.0), None)
        .unwrap();
    assert_eq!(moved.latitude, 60.0);
    assert_eq!(moved.longitude, 37.0);
    assert_eq!(moved.address, "ул. Ленина, 1");

    let err = buildings
        .update_building(created.id, None, None, Some(200.0))
        .unwrap_err();
    assert!(matches!(
        err,
        BuildingServiceError::InvalidBuilding(BuildingValidationError::LongitudeOutOfRange(_))
    ));

    // The failed update leaves the row as it was.
    let reloaded = buildings.get_building(created.id).unwrap().unwrap();
    assert_eq!(reloaded.longitude, 37.0);
}

#[test]
fn update_or_delete_of_missing_building_errors() {
    let conn = setup();
    let buildings = building_service(&conn);

    let update_err = buildings
        .update_building(4242, Some("ул. Мира, 10".to_string()), None, None)
        .unwrap_err();
    assert!(matches!(
        update_err,
        BuildingServiceError::BuildingNotFound(4242)
    ));

    let delete_err = buildings.delete_building(4242).unwrap_err();
    assert!(matches!(
        delete_err,
        BuildingServiceError::BuildingNotFound(4242)
    ));
}

#[test]
fn delete_of_a_building_housing_organizations_is_rejected() {
    let conn = setup();
    let buildings = building_service(&conn);
    let orgs = OrganizationService::new(
        SqliteOrganizationRepository::new(&conn),
        ActivityService::new(SqliteActivityRepository::try_new(&conn).unwrap()),
        SqliteBuildingRepository::new(&conn),
    );

    let office = buildings
        .create_building("ул. Ленина, 1", 55.0, 37.0)
        .unwrap();
    let tenant = orgs
        .create_organization("Вектор", &[], Some(office.id), &[])
        .unwrap();

    let err = buildings.delete_building(office.id).unwrap_err();
    assert!(matches!(
        err,
        BuildingServiceError::Repo(BuildingRepoError::ConstraintViolation(_))
    ));

    orgs.delete_organization(tenant.organization.id).unwrap();
    buildings.delete_building(office.id).unwrap();
    assert!(buildings.get_building(office.id).unwrap().is_none());
}

#[test]
fn list_returns_buildings_in_id_order() {
    let conn = setup();
    let buildings = building_service(&conn);

    let first = buildings
        .create_building("ул. Ленина, 1", 55.0, 37.0)
        .unwrap();
    let second = buildings
        .create_building("ул. Мира, 10", 56.0, 38.0)
        .unwrap();

    let all = buildings.list_buildings().unwrap();
    let ids: Vec<i64> = all.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}
