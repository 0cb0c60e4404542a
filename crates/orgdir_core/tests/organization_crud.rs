use orgdir_core::db::open_db_in_memory;
use orgdir_core::{
    ActivityService, BuildingService, OrganizationService, OrganizationServiceError,
    OrganizationValidationError, SqliteActivityRepository, SqliteBuildingRepository,
    SqliteOrganizationRepository,
};

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

fn organization_service(
    conn: &rusqlite::Connection,
) -> OrganizationService<
    SqliteOrganizationRepository<'_>,
    SqliteActivityRepository<'_>,
    SqliteBuildingRepository<'_>,
> {
    OrganizationService::new(
        SqliteOrganizationRepository::new(conn),
        ActivityService::new(SqliteActivityRepository::try_new(conn).unwrap()),
        SqliteBuildingRepository::new(conn),
    )
}

fn activity_service(conn: &rusqlite::Connection) -> ActivityService<SqliteActivityRepository<'_>> {
    ActivityService::new(SqliteActivityRepository::try_new(conn).unwrap())
}

fn building_service(conn: &rusqlite::Connection) -> BuildingService<SqliteBuildingRepository<'_>> {
    BuildingService::new(SqliteBuildingRepository::new(conn))
}

fn phones(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn count_rows(conn: &rusqlite::Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn create_returns_the_full_record() {
    let conn = setup();
    let orgs = organization_service(&conn);
    let activities = activity_service(&conn);
    let buildings = building_service(&conn);

    let office = buildings
        .create_building("ул. Ленина, 1", 55.7558, 37.6173)
        .unwrap();
    let food = activities.create_activity("Еда", None).unwrap();
    let meat = activities
        .create_activity("Мясная продукция", Some(food.id))
        .unwrap();

    let record = orgs
        .create_organization(
            "Орион",
            &phones(&["+79991234567", "2-222-222"]),
            Some(office.id),
            &[meat.id, food.id],
        )
        .unwrap();

    assert!(record.organization.id > 0);
    assert_eq!(record.organization.name, "Орион");
    assert_eq!(record.organization.phones, phones(&["+79991234567", "2-222-222"]));
    assert_eq!(record.organization.building_id, Some(office.id));
    assert_eq!(
        record.building.as_ref().map(|b| b.address.as_str()),
        Some("ул. Ленина, 1")
    );
    // Associations come back ordered by activity id.
    let linked: Vec<i64> = record.activities.iter().map(|a| a.id).collect();
    assert_eq!(linked, vec![food.id, meat.id]);

    let reloaded = orgs.get_organization(record.organization.id).unwrap();
    assert_eq!(reloaded, Some(record));
}

#[test]
fn create_without_building_or_activities_is_allowed() {
    let conn = setup();
    let orgs = organization_service(&conn);

    let record = orgs
        .create_organization("Вектор", &phones(&["+79991234567"]), None, &[])
        .unwrap();

    assert_eq!(record.organization.building_id, None);
    assert!(record.building.is_none());
    assert!(record.activities.is_empty());
}

#[test]
fn create_with_unknown_building_leaves_the_store_untouched() {
    let conn = setup();
    let orgs = organization_service(&conn);

    let err = orgs
        .create_organization("Вектор", &[], Some(4242), &[])
        .unwrap_err();
    assert!(matches!(err, OrganizationServiceError::BuildingNotFound(4242)));
    assert!(orgs.list_organizations().unwrap().is_empty());
}

#[test]
fn duplicate_activity_ids_fail_before_any_write() {
    let conn = setup();
    let orgs = organization_service(&conn);
    let activities = activity_service(&conn);

    let food = activities.create_activity("Еда", None).unwrap();

    let err = orgs
        .create_organization("Вектор", &[], None, &[food.id, food.id])
        .unwrap_err();
    assert!(matches!(
        err,
        OrganizationServiceError::DuplicateActivityId(id) if id == food.id
    ));
    assert!(orgs.list_organizations().unwrap().is_empty());
    assert_eq!(count_rows(&conn, "organization_activities"), 0);
}

#[test]
fn unknown_activity_ids_are_reported_sorted() {
    let conn = setup();
    let orgs = organization_service(&conn);
    let activities = activity_service(&conn);

    let food = activities.create_activity("Еда", None).unwrap();

    let err = orgs
        .create_organization("Вектор", &[], None, &[food.id, 999, 555])
        .unwrap_err();
    assert!(matches!(
        err,
        OrganizationServiceError::UnknownActivityIds(missing) if missing == vec![555, 999]
    ));
    assert!(orgs.list_organizations().unwrap().is_empty());
}

#[test]
fn invalid_phones_and_blank_names_are_rejected() {
    let conn = setup();
    let orgs = organization_service(&conn);

    let bad_phone = orgs
        .create_organization("Вектор", &phones(&["+79991234567", "bogus"]), None, &[])
        .unwrap_err();
    assert!(matches!(
        bad_phone,
        OrganizationServiceError::InvalidOrganization(OrganizationValidationError::InvalidPhone(
            value
        )) if value == "bogus"
    ));

    let blank = orgs.create_organization("   ", &[], None, &[]).unwrap_err();
    assert!(matches!(
        blank,
        OrganizationServiceError::InvalidOrganization(OrganizationValidationError::BlankName)
    ));
}

#[test]
fn update_touches_only_the_given_fields() {
    let conn = setup();
    let orgs = organization_service(&conn);
    let activities = activity_service(&conn);
    let buildings = building_service(&conn);

    let office = buildings
        .create_building("ул. Ленина, 1", 55.7558, 37.6173)
        .unwrap();
    let annex = buildings
        .create_building("ул. Мира, 10", 55.7580, 37.6200)
        .unwrap();
    let food = activities.create_activity("Еда", None).unwrap();

    let record = orgs
        .create_organization(
            "Орион",
            &phones(&["+79991234567"]),
            Some(office.id),
            &[food.id],
        )
        .unwrap();
    let id = record.organization.id;

    let renamed = orgs
        .update_organization(id, Some("Орион плюс".to_string()), None, None, None)
        .unwrap();
    assert_eq!(renamed.organization.name, "Орион плюс");
    assert_eq!(renamed.organization.phones, phones(&["+79991234567"]));
    assert_eq!(renamed.organization.building_id, Some(office.id));
    assert_eq!(renamed.activities.len(), 1);

    let rephoned = orgs
        .update_organization(
            id,
            None,
            Some(&phones(&["2-222-222", "8-999-123-45-67"])),
            None,
            None,
        )
        .unwrap();
    assert_eq!(
        rephoned.organization.phones,
        phones(&["2-222-222", "8-999-123-45-67"])
    );
    assert_eq!(rephoned.organization.name, "Орион плюс");

    let moved = orgs
        .update_organization(id, None, None, Some(annex.id), None)
        .unwrap();
    assert_eq!(moved.organization.building_id, Some(annex.id));
    assert_eq!(
        moved.building.as_ref().map(|b| b.address.as_str()),
        Some("ул. Мира, 10")
    );
}

#[test]
fn update_with_empty_id_list_clears_associations() {
    let conn = setup();
    let orgs = organization_service(&conn);
    let activities = activity_service(&conn);

    let food = activities.create_activity("Еда", None).unwrap();
    let record = orgs
        .create_organization("Вектор", &phones(&["+79991234567"]), None, &[food.id])
        .unwrap();
    let id = record.organization.id;

    let untouched = orgs
        .update_organization(id, None, None, None, None)
        .unwrap();
    assert_eq!(untouched.activities.len(), 1);

    let cleared = orgs
        .update_organization(id, None, None, None, Some(&[]))
        .unwrap();
    assert!(cleared.activities.is_empty());
    assert_eq!(cleared.organization.phones, phones(&["+79991234567"]));
    assert_eq!(count_rows(&conn, "organization_activities"), 0);
}

#[test]
fn update_validates_references_and_ids() {
    let conn = setup();
    let orgs = organization_service(&conn);
    let activities = activity_service(&conn);

    let food = activities.create_activity("Еда", None).unwrap();
    let record = orgs
        .create_organization("Вектор", &[], None, &[food.id])
        .unwrap();
    let id = record.organization.id;

    let missing_building = orgs
        .update_organization(id, None, None, Some(4242), None)
        .unwrap_err();
    assert!(matches!(
        missing_building,
        OrganizationServiceError::BuildingNotFound(4242)
    ));

    let duplicated = orgs
        .update_organization(id, None, None, None, Some(&[food.id, food.id]))
        .unwrap_err();
    assert!(matches!(
        duplicated,
        OrganizationServiceError::DuplicateActivityId(dup) if dup == food.id
    ));

    let unknown = orgs
        .update_organization(id, None, None, None, Some(&[999]))
        .unwrap_err();
    assert!(matches!(
        unknown,
        OrganizationServiceError::UnknownActivityIds(missing) if missing == vec![999]
    ));

    // Failed updates leave the record as it was.
    let reloaded = orgs.get_organization(id).unwrap().unwrap();
    assert_eq!(reloaded.organization.building_id, None);
    assert_eq!(reloaded.activities.len(), 1);
}

#[test]
fn update_of_missing_organization_errors() {
    let conn = setup();
    let orgs = organization_service(&conn);

    let err = orgs
        .update_organization(4242, Some("Вектор".to_string()), None, None, None)
        .unwrap_err();
    assert!(matches!(
        err,
        OrganizationServiceError::OrganizationNotFound(4242)
    ));
}

#[test]
fn delete_cascades_phones_and_associations() {
    let conn = setup();
    let orgs = organization_service(&conn);
    let activities = activity_service(&conn);

    let food = activities.create_activity("Еда", None).unwrap();
    let record = orgs
        .create_organization(
            "Вектор",
            &phones(&["+79991234567", "2-222-222"]),
            None,
            &[food.id],
        )
        .unwrap();
    let id = record.organization.id;
    assert_eq!(count_rows(&conn, "organization_phones"), 2);
    assert_eq!(count_rows(&conn, "organization_activities"), 1);

    orgs.delete_organization(id).unwrap();

    assert!(orgs.get_organization(id).unwrap().is_none());
    assert_eq!(count_rows(&conn, "organization_phones"), 0);
    assert_eq!(count_rows(&conn, "organization_activities"), 0);

    let err = orgs.delete_organization(id).unwrap_err();
    assert!(matches!(
        err,
        OrganizationServiceError::OrganizationNotFound(missing) if missing == id
    ));
}

#[test]
fn organizations_by_building_lists_only_tenants() {
    let conn = setup();
    let orgs = organization_service(&conn);
    let buildings = building_service(&conn);

    let office = buildings
        .create_building("ул. Ленина, 1", 55.7558, 37.6173)
        .unwrap();
    let annex = buildings
        .create_building("ул. Мира, 10", 55.7580, 37.6200)
        .unwrap();

    let first = orgs
        .create_organization("Альфа", &[], Some(office.id), &[])
        .unwrap();
    let second = orgs
        .create_organization("Бета", &[], Some(office.id), &[])
        .unwrap();
    orgs.create_organization("Гамма", &[], Some(annex.id), &[])
        .unwrap();
    orgs.create_organization("Дельта", &[], None, &[]).unwrap();

    let tenants = orgs.organizations_by_building(office.id).unwrap();
    let ids: Vec<i64> = tenants.iter().map(|r| r.organization.id).collect();
    assert_eq!(ids, vec![first.organization.id, second.organization.id]);

    assert!(orgs.organizations_by_building(4242).unwrap().is_empty());
}

#[test]
fn organizations_by_activity_expands_the_subtree_without_duplicates() {
    let conn = setup();
    let orgs = organization_service(&conn);
    let activities = activity_service(&conn);

    let food = activities.create_activity("Еда", None).unwrap();
    let meat = activities
        .create_activity("Мясная продукция", Some(food.id))
        .unwrap();
    let beef = activities.create_activity("Говядина", Some(meat.id)).unwrap();
    let cars = activities.create_activity("Автомобили", None).unwrap();

    // Tagged twice inside the subtree, must still come back once.
    let butcher = orgs
        .create_organization("Мясной двор", &[], None, &[meat.id, beef.id])
        .unwrap();
    let steakhouse = orgs
        .create_organization("Стейк-хаус", &[], None, &[beef.id])
        .unwrap();
    let garage = orgs
        .create_organization("Гараж", &[], None, &[cars.id])
        .unwrap();

    let by_food = orgs.organizations_by_activity(food.id).unwrap();
    let ids: Vec<i64> = by_food.iter().map(|r| r.organization.id).collect();
    assert_eq!(
        ids,
        vec![butcher.organization.id, steakhouse.organization.id]
    );

    let by_meat = orgs.organizations_by_activity(meat.id).unwrap();
    let ids: Vec<i64> = by_meat.iter().map(|r| r.organization.id).collect();
    assert_eq!(
        ids,
        vec![butcher.organization.id, steakhouse.organization.id]
    );

    let by_cars = orgs.organizations_by_activity(cars.id).unwrap();
    let ids: Vec<i64> = by_cars.iter().map(|r| r.organization.id).collect();
    assert_eq!(ids, vec![garage.organization.id]);
}

#[test]
fn organizations_by_missing_activity_is_empty() {
    let conn = setup();
    let orgs = organization_service(&conn);

    assert!(orgs.organizations_by_activity(4242).unwrap().is_empty());
}
