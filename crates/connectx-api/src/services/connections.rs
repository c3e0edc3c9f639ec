use tracing::{debug, info};
use uuid::Uuid;

use connectx_db::Database;
use connectx_db::models::{self, ConnectionRow};
use connectx_db::queries::RequestOutcome;
use connectx_types::api::{ConnectionStatusResponse, MessageResponse};
use connectx_types::models::{Connection, ConnectionState, ConnectionStatus, UserRef};

use crate::error::{ApiError, ApiResult};
use crate::services::directory::{Directory, Fields};
use crate::services::users::require_user;

fn parse_status(row: &ConnectionRow) -> anyhow::Result<ConnectionStatus> {
    row.status.parse::<ConnectionStatus>().map_err(anyhow::Error::msg)
}

fn connection_view<R>(row: ConnectionRow, requester: R) -> anyhow::Result<Connection<R>> {
    let status = parse_status(&row)?;

    Ok(Connection {
        id: row.id,
        requester,
        recipient: row.recipient,
        status,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub fn list(db: &Database, caller: Uuid) -> ApiResult<Vec<UserRef>> {
    let me = require_user(db, caller)?;
    let dir = Directory::load(db, me.connections.iter().copied())?;
    Ok(dir.many(&me.connections, Fields::Card))
}

/// Open a pending request. A pair whose last request was rejected may ask
/// again in either direction; the old row is reused.
pub fn send_request(db: &Database, requester: Uuid, recipient: Uuid) -> ApiResult<Connection> {
    if requester == recipient {
        return Err(ApiError::validation("You cannot connect with yourself"));
    }
    if db.get_user(recipient)?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let now = models::now();
    let row = ConnectionRow {
        id: Uuid::new_v4(),
        requester,
        recipient,
        status: ConnectionStatus::Pending.to_string(),
        created_at: now,
        updated_at: now,
    };

    match db.open_connection_request(&row)? {
        RequestOutcome::Exists(_) => Err(ApiError::conflict("Connection request already exists")),
        RequestOutcome::Opened(row) => {
            debug!(request_id = %row.id, %requester, %recipient, "connection requested");
            Ok(connection_view(row, requester)?)
        }
    }
}

/// Load a request addressed to `caller`.
fn request_for(db: &Database, caller: Uuid, request_id: Uuid) -> ApiResult<ConnectionRow> {
    let row = db
        .get_connection(request_id)?
        .ok_or_else(|| ApiError::not_found("Connection request not found"))?;

    if row.recipient != caller {
        return Err(ApiError::unauthorized("Not authorized"));
    }
    Ok(row)
}

/// Accepting an already accepted request is a no-op success.
pub fn accept(db: &Database, caller: Uuid, request_id: Uuid) -> ApiResult<Connection> {
    let row = request_for(db, caller, request_id)?;
    if parse_status(&row)? == ConnectionStatus::Rejected {
        return Err(ApiError::not_found("Connection request not found or already processed"));
    }

    db.set_connection_status(row.id, &ConnectionStatus::Accepted.to_string())?;
    db.add_connection(row.requester, row.recipient)?;
    db.add_connection(row.recipient, row.requester)?;
    info!(request_id = %row.id, requester = %row.requester, recipient = %row.recipient, "connection accepted");

    let row = db
        .get_connection(request_id)?
        .ok_or_else(|| ApiError::not_found("Connection request not found"))?;
    let requester = row.requester;
    Ok(connection_view(row, requester)?)
}

/// Only a pending request can be rejected.
pub fn reject(db: &Database, caller: Uuid, request_id: Uuid) -> ApiResult<Connection> {
    let row = request_for(db, caller, request_id)?;
    if parse_status(&row)? != ConnectionStatus::Pending {
        return Err(ApiError::not_found("Connection request not found or already processed"));
    }

    db.set_connection_status(row.id, &ConnectionStatus::Rejected.to_string())?;
    info!(request_id = %row.id, requester = %row.requester, recipient = %row.recipient, "connection rejected");

    let row = db
        .get_connection(request_id)?
        .ok_or_else(|| ApiError::not_found("Connection request not found"))?;
    let requester = row.requester;
    Ok(connection_view(row, requester)?)
}

pub fn status(db: &Database, caller: Uuid, other: Uuid) -> ApiResult<ConnectionStatusResponse> {
    if caller == other {
        return Ok(ConnectionStatusResponse {
            status: ConnectionState::NotConnected,
            request_id: None,
            is_sender: None,
            message: Some("Cannot connect with yourself".to_string()),
        });
    }
    require_user(db, other)?;

    let Some(row) = db.find_connection_between(caller, other)? else {
        return Ok(ConnectionStatusResponse {
            status: ConnectionState::NotConnected,
            request_id: None,
            is_sender: None,
            message: None,
        });
    };

    let state = match parse_status(&row)? {
        ConnectionStatus::Pending => ConnectionState::Pending,
        ConnectionStatus::Accepted => ConnectionState::Connected,
        ConnectionStatus::Rejected => ConnectionState::NotConnected,
    };

    Ok(ConnectionStatusResponse {
        status: state,
        request_id: Some(row.id),
        is_sender: Some(row.requester == caller),
        message: None,
    })
}

pub fn remove(db: &Database, caller: Uuid, other: Uuid) -> ApiResult<MessageResponse> {
    db.remove_connection(caller, other)?;
    db.remove_connection(other, caller)?;
    let deleted = db.delete_connections_between(caller, other)?;
    debug!(%caller, %other, deleted, "connection removed");

    Ok(MessageResponse::new("Connection removed successfully"))
}

pub fn pending_requests(db: &Database, caller: Uuid) -> ApiResult<Vec<Connection<UserRef>>> {
    let rows = db.pending_requests_for(caller)?;
    let dir = Directory::load(db, rows.iter().map(|r| r.requester))?;

    rows.into_iter()
        .map(|row| {
            let requester = dir.one(row.requester, Fields::Headline);
            Ok(connection_view(row, requester)?)
        })
        .collect()
}
