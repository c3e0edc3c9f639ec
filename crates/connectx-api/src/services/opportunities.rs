use tracing::info;
use uuid::Uuid;
use validator::Validate;

use connectx_db::Database;
use connectx_db::models::{self, DEFAULT_LOCATION, OpportunityRow};
use connectx_types::api::{ApplyResponse, CreateOpportunityRequest};
use connectx_types::models::{Opportunity, OpportunityKind, UserRef};

use crate::error::{ApiError, ApiResult};
use crate::services::directory::{Directory, Fields};

fn opportunity_view<A>(row: OpportunityRow, created_by: UserRef, applicants: Vec<A>) -> anyhow::Result<Opportunity<A>> {
    let kind = row
        .kind
        .parse::<OpportunityKind>()
        .map_err(anyhow::Error::msg)?;

    Ok(Opportunity {
        id: row.id,
        title: row.title,
        description: row.description,
        kind,
        company: row.company,
        location: row.location,
        tags: row.tags,
        deadline: row.deadline,
        applicants,
        created_by,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// List view: creator expanded, applicants left as ids.
fn summary(dir: &Directory, row: OpportunityRow) -> anyhow::Result<Opportunity> {
    let created_by = dir.one(row.created_by, Fields::Basic);
    let applicants = row.applicants.clone();
    opportunity_view(row, created_by, applicants)
}

fn load_summary(db: &Database, row: OpportunityRow) -> anyhow::Result<Opportunity> {
    let dir = Directory::load(db, [row.created_by])?;
    summary(&dir, row)
}

pub fn list(db: &Database) -> ApiResult<Vec<Opportunity>> {
    let rows = db.list_opportunities()?;
    let dir = Directory::load(db, rows.iter().map(|r| r.created_by))?;

    rows.into_iter()
        .map(|row| Ok(summary(&dir, row)?))
        .collect()
}

pub fn create(db: &Database, creator: Uuid, req: CreateOpportunityRequest) -> ApiResult<Opportunity> {
    req.validate()?;
    let kind = req
        .kind
        .parse::<OpportunityKind>()
        .map_err(ApiError::Validation)?;

    let location = req
        .location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

    let now = models::now();
    let row = OpportunityRow {
        id: Uuid::new_v4(),
        title: req.title.trim().to_string(),
        description: req.description.trim().to_string(),
        kind: kind.to_string(),
        company: req.company.trim().to_string(),
        location,
        tags: req.tags.unwrap_or_default(),
        deadline: req.deadline,
        applicants: Vec::new(),
        created_by: creator,
        created_at: now,
        updated_at: now,
    };
    db.insert_opportunity(&row)?;
    info!(opportunity_id = %row.id, %creator, kind = %kind, "opportunity created");

    Ok(load_summary(db, row)?)
}

/// Detail view: applicants expanded with their headline.
pub fn get(db: &Database, id: Uuid) -> ApiResult<Opportunity<UserRef>> {
    let row = db
        .get_opportunity(id)?
        .ok_or_else(|| ApiError::not_found("Opportunity not found"))?;

    let dir = Directory::load(db, std::iter::once(row.created_by).chain(row.applicants.iter().copied()))?;
    let created_by = dir.one(row.created_by, Fields::Basic);
    let applicants = dir.many(&row.applicants, Fields::Headline);

    Ok(opportunity_view(row, created_by, applicants)?)
}

pub fn apply(db: &Database, caller: Uuid, id: Uuid) -> ApiResult<ApplyResponse> {
    match db.add_applicant(id, caller)? {
        None => return Err(ApiError::not_found("Opportunity not found")),
        Some(false) => return Err(ApiError::conflict("Already applied to this opportunity")),
        Some(true) => {}
    }

    let row = db
        .get_opportunity(id)?
        .ok_or_else(|| ApiError::not_found("Opportunity not found"))?;

    Ok(ApplyResponse {
        message: "Applied successfully".to_string(),
        opportunity: load_summary(db, row)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectx_db::models::UserRow;

    fn setup() -> (Database, Uuid) {
        let db = Database::open_in_memory().unwrap();
        let user = UserRow::new("Alice", "alice@x.com", "hash");
        db.insert_user(&user).unwrap();
        (db, user.id)
    }

    fn hackathon(title: &str) -> CreateOpportunityRequest {
        CreateOpportunityRequest {
            title: title.to_string(),
            description: "Build things".to_string(),
            kind: "Hackathon".to_string(),
            company: "Acme".to_string(),
            location: Some("  ".to_string()),
            tags: None,
            deadline: None,
        }
    }

    #[test]
    fn create_applies_defaults() {
        let (db, alice) = setup();
        let opp = create(&db, alice, hackathon("Hack")).unwrap();

        assert_eq!(opp.kind, OpportunityKind::Hackathon);
        assert_eq!(opp.location, "Remote");
        assert!(opp.tags.is_empty());
        assert_eq!(opp.created_by.name, "Alice");
    }

    #[test]
    fn create_validation() {
        let (db, alice) = setup();

        let mut req = hackathon("   ");
        req.company = String::new();
        match create(&db, alice, req) {
            Err(ApiError::Validation(msg)) => assert_eq!(msg, "Company is required, Title is required"),
            other => panic!("expected validation error, got {other:?}"),
        }

        req = hackathon("Hack");
        req.kind = "meetup".to_string();
        assert!(matches!(create(&db, alice, req), Err(ApiError::Validation(_))));

        assert!(list(&db).unwrap().is_empty());
    }

    #[test]
    fn created_at_matches_what_is_read_back() {
        let (db, alice) = setup();
        let created = create(&db, alice, hackathon("  Hack  ")).unwrap();
        assert_eq!(created.title, "Hack");

        let read = get(&db, created.id).unwrap();
        assert_eq!(read.created_at, created.created_at);
        assert_eq!(read.updated_at, created.updated_at);
    }

    #[test]
    fn list_is_newest_first() {
        let (db, alice) = setup();
        create(&db, alice, hackathon("Old")).unwrap();
        create(&db, alice, hackathon("New")).unwrap();

        let titles: Vec<String> = list(&db).unwrap().into_iter().map(|o| o.title).collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[test]
    fn apply_once_only() {
        let (db, alice) = setup();
        let opp = create(&db, alice, hackathon("Hack")).unwrap();

        let resp = apply(&db, alice, opp.id).unwrap();
        assert_eq!(resp.message, "Applied successfully");
        assert_eq!(resp.opportunity.applicants, vec![alice]);

        assert!(matches!(apply(&db, alice, opp.id), Err(ApiError::Conflict(_))));
        assert!(matches!(apply(&db, alice, Uuid::new_v4()), Err(ApiError::NotFound(_))));

        let detail = get(&db, opp.id).unwrap();
        assert_eq!(detail.applicants.len(), 1);
        assert_eq!(detail.applicants[0].name, "Alice");
        assert!(detail.applicants[0].headline.is_some());
    }
}
