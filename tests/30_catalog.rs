mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

use common::TestApp;
use shelter_api::database::models::{Animal, Breed, Disease, RoleRecord, Species};
use shelter_api::services::catalog::animal::CreateAnimal;
use shelter_api::services::catalog::breed::{CreateBreed, UpdateBreed};
use shelter_api::services::catalog::disease::CreateDisease;
use shelter_api::services::catalog::role::{CreateRole, UpdateRole};
use shelter_api::services::catalog::species::{CreateSpecies, UpdateSpecies};
use shelter_api::services::{CatalogService, FailureCode, ResultKind};
use shelter_api::types::{PageRequest, Role};

async fn dog(app: &TestApp) -> Result<Uuid> {
    let species = app
        .state
        .catalog::<Species>()
        .create(&app.admin, CreateSpecies { name: "Dog".into() })
        .await;
    species.data.map(|s| s.id).ok_or_else(|| anyhow::anyhow!(species.message))
}

#[tokio::test]
async fn breed_names_are_unique_ignoring_case() -> Result<()> {
    let app = TestApp::new().await?;
    let species_id = dog(&app).await?;
    let breeds = app.state.catalog::<Breed>();

    let first = breeds.create(&app.admin, CreateBreed { name: "Labrador".into(), species_id }).await;
    assert!(first.is_success(), "{}", first.message);
    assert_eq!(first.message, "Breed created");

    let second = breeds.create(&app.admin, CreateBreed { name: "LABRADOR".into(), species_id }).await;
    assert_eq!(second.kind, ResultKind::Error);
    assert_eq!(second.code, Some(FailureCode::Duplicate));
    Ok(())
}

#[tokio::test]
async fn breed_requires_an_active_species() -> Result<()> {
    let app = TestApp::new().await?;
    let breeds = app.state.catalog::<Breed>();

    let missing = breeds
        .create(&app.admin, CreateBreed { name: "Siamese".into(), species_id: Uuid::new_v4() })
        .await;
    assert_eq!(missing.kind, ResultKind::Invalid);
    assert_eq!(missing.code, Some(FailureCode::InvalidInput));

    let species_id = dog(&app).await?;
    assert!(app.state.catalog::<Species>().remove(&app.admin, species_id).await.is_success());
    let deleted = breeds.create(&app.admin, CreateBreed { name: "Beagle".into(), species_id }).await;
    assert_eq!(deleted.kind, ResultKind::Invalid);
    Ok(())
}

#[tokio::test]
async fn pagination_rounds_total_pages_up() -> Result<()> {
    let app = TestApp::new().await?;
    let species = app.state.catalog::<Species>();
    for i in 0..47 {
        let created = species.create(&app.admin, CreateSpecies { name: format!("Species {:02}", i) }).await;
        assert!(created.is_success(), "{}", created.message);
    }

    let first = species.find_all(PageRequest::new(1, 15)).await.data.unwrap();
    assert_eq!(first.pagination.total_count, 47);
    assert_eq!(first.pagination.total_pages, 4);
    assert_eq!(first.data.len(), 15);
    assert_eq!(first.data[0].name, "Species 00");

    let last = species.find_all(PageRequest::new(4, 15)).await.data.unwrap();
    assert_eq!(last.data.len(), 2);
    assert_eq!(last.data[1].name, "Species 46");
    Ok(())
}

#[tokio::test]
async fn removed_records_disappear_but_stay_restorable() -> Result<()> {
    let app = TestApp::new().await?;
    let species: CatalogService<Species> = app.state.catalog();
    let id = dog(&app).await?;

    let removed = species.remove(&app.admin, id).await;
    assert!(removed.is_success(), "{}", removed.message);
    assert_eq!(removed.message, format!("Administrator Root deactivated species {}", id));

    let listing = species.find_all(PageRequest::default()).await.data.unwrap();
    assert!(listing.data.iter().all(|s| s.id != id));
    assert_eq!(species.find_one(id).await.code, Some(FailureCode::NotFound));

    let again = species.remove(&app.admin, id).await;
    assert_eq!(again.code, Some(FailureCode::InvalidState));

    let restored = species.restore(&app.admin, id).await;
    assert!(restored.is_success(), "{}", restored.message);
    assert!(species.find_one(id).await.is_success());

    let twice = species.restore(&app.admin, id).await;
    assert_eq!(twice.code, Some(FailureCode::InvalidState));
    Ok(())
}

#[tokio::test]
async fn moderators_edit_but_do_not_create_or_restore() -> Result<()> {
    let app = TestApp::new().await?;
    let moderator = app.moderator("Mod", "mod@example.com").await?;
    let species: CatalogService<Species> = app.state.catalog();
    let id = dog(&app).await?;

    let create = species.create(&moderator, CreateSpecies { name: "Cat".into() }).await;
    assert_eq!(create.code, Some(FailureCode::PermissionDenied));

    let update = species.update(&moderator, id, UpdateSpecies { name: Some("Canine".into()) }).await;
    assert!(update.is_success(), "{}", update.message);
    assert_eq!(update.data.unwrap().name, "Canine");

    assert!(species.remove(&moderator, id).await.is_success());
    let restore = species.restore(&moderator, id).await;
    assert_eq!(restore.code, Some(FailureCode::PermissionDenied));
    Ok(())
}

#[tokio::test]
async fn update_needs_a_field_and_checks_duplicates() -> Result<()> {
    let app = TestApp::new().await?;
    let species_id = dog(&app).await?;
    let breeds = app.state.catalog::<Breed>();
    let lab = breeds.create(&app.admin, CreateBreed { name: "Labrador".into(), species_id }).await.data.unwrap();
    breeds.create(&app.admin, CreateBreed { name: "Poodle".into(), species_id }).await;

    let empty = breeds.update(&app.admin, lab.id, UpdateBreed::default()).await;
    assert_eq!(empty.kind, ResultKind::Invalid);

    let clash = breeds
        .update(&app.admin, lab.id, UpdateBreed { name: Some("poodle".into()), ..Default::default() })
        .await;
    assert_eq!(clash.code, Some(FailureCode::Duplicate));

    let same = breeds
        .update(&app.admin, lab.id, UpdateBreed { name: Some("LABRADOR".into()), ..Default::default() })
        .await;
    assert!(same.is_success(), "{}", same.message);
    Ok(())
}

#[tokio::test]
async fn search_is_case_insensitive_substring() -> Result<()> {
    let app = TestApp::new().await?;
    let species_id = dog(&app).await?;
    let breeds = app.state.catalog::<Breed>();
    for name in ["Labrador", "Golden Retriever", "Labradoodle"] {
        breeds.create(&app.admin, CreateBreed { name: name.into(), species_id }).await;
    }

    let found = breeds.find_by_name("LABRA").await.data.unwrap();
    assert_eq!(found.len(), 2);

    let none = breeds.find_by_name("husky").await;
    assert_eq!(none.code, Some(FailureCode::NotFound));

    let blank = breeds.find_by_name("  ").await;
    assert_eq!(blank.kind, ResultKind::Invalid);
    Ok(())
}

#[tokio::test]
async fn disease_defaults_apply() -> Result<()> {
    let app = TestApp::new().await?;
    let created = app
        .state
        .catalog::<Disease>()
        .create(&app.admin, CreateDisease { name: None, severity: None })
        .await;
    let disease = created.data.unwrap();
    assert_eq!(disease.name, "ninguno");
    assert_eq!(disease.severity, "ninguna");
    Ok(())
}

#[tokio::test]
async fn animal_checks_every_reference() -> Result<()> {
    let app = TestApp::new().await?;
    let species_id = dog(&app).await?;
    let breed_id = app
        .state
        .catalog::<Breed>()
        .create(&app.admin, CreateBreed { name: "Mestizo".into(), species_id })
        .await
        .data
        .unwrap()
        .id;
    let animals = app.state.catalog::<Animal>();
    let dto = CreateAnimal {
        name: "Firulais".into(),
        species_id,
        breed_id,
        disease_id: None,
        characteristics_id: None,
        health_status: true,
        entry_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        adopted: false,
        photos: vec![],
        information: None,
        status: None,
    };

    let created = animals.create(&app.admin, dto.clone()).await;
    assert!(created.is_success(), "{}", created.message);
    assert!(created.data.unwrap().status);

    let orphan = animals.create(&app.admin, CreateAnimal { disease_id: Some(Uuid::new_v4()), ..dto }).await;
    assert_eq!(orphan.kind, ResultKind::Invalid);
    Ok(())
}

#[tokio::test]
async fn http_catalog_policies() -> Result<()> {
    let app = TestApp::new().await?;
    let user = app.user("Ana", "ana@example.com").await?;
    let user_token = app.token(&user)?;
    let admin_token = app.token(&app.admin)?;

    let (status, created) = app
        .request(Method::POST, "/api/species", Some(&admin_token), Some(json!({ "name": "Dog" })))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .request(Method::POST, "/api/species", Some(&user_token), Some(json!({ "name": "Cat" })))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, listing) = app.request(Method::GET, "/api/species?page=1&page_size=5", Some(&user_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["data"]["pagination"]["total_count"], 1);
    assert_eq!(listing["data"]["pagination"]["page_size"], 5);

    let (status, _) = app
        .request(Method::PATCH, &format!("/api/species/{}", id), Some(&user_token), Some(json!({ "name": "Canine" })))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, found) = app.request(Method::GET, "/api/species/search?name=DO", Some(&user_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["data"][0]["name"], "Dog");

    let (status, _) = app.request(Method::DELETE, &format!("/api/species/{}", id), Some(&admin_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, missing) = app.request(Method::GET, &format!("/api/species/{}", id), Some(&user_token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["code"], "not_found");

    let (status, _) = app
        .request(Method::PATCH, &format!("/api/species/{}/restore", id), Some(&admin_token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, roles) = app.request(Method::GET, "/api/roles", Some(&user_token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", roles);
    Ok(())
}

#[tokio::test]
async fn built_in_roles_cannot_be_renamed_or_removed() -> Result<()> {
    let app = TestApp::new().await?;
    let roles = app.state.catalog::<RoleRecord>();
    let admin_role = app.role_id(Role::Admin).await?;
    let user_role = app.role_id(Role::User).await?;

    let renamed = roles
        .update(&app.admin, admin_role, UpdateRole { description: Some("keeper".into()) })
        .await;
    assert_eq!(renamed.code, Some(FailureCode::PermissionDenied));
    assert!(app.users().principal(app.admin.id).await?.is_some());

    let removed = roles.remove(&app.admin, user_role).await;
    assert_eq!(removed.code, Some(FailureCode::PermissionDenied));
    let ana = app.user("Ana", "ana@example.com").await?;
    assert_eq!(ana.role, Role::User);
    Ok(())
}

#[tokio::test]
async fn custom_roles_stay_editable() -> Result<()> {
    let app = TestApp::new().await?;
    let roles = app.state.catalog::<RoleRecord>();
    let created = roles.create(&app.admin, CreateRole { description: "Volunteer".into() }).await;
    let id = created.data.map(|r| r.id).ok_or_else(|| anyhow::anyhow!(created.message))?;

    let renamed = roles
        .update(&app.admin, id, UpdateRole { description: Some("Foster".into()) })
        .await;
    assert!(renamed.is_success(), "{}", renamed.message);
    assert!(roles.remove(&app.admin, id).await.is_success());
    assert!(roles.restore(&app.admin, id).await.is_success());
    Ok(())
}
