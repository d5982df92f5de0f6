//! Transport-agnostic request handlers for the points endpoints
//!
//! Each handler takes the caller's credential and a raw JSON body and
//! returns a [`Response`] whose body is either a result payload or a plain
//! message string. Mapping that onto an HTTP server is left to the host.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::concurrent_ledger::ShardedLedger;
use crate::error::LedgerError;
use crate::store::{InMemoryStore, RecordStore};

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// No usable credential was presented
    Unauthenticated,
    /// The credential is valid but may not act for this user
    Denied,
}

/// Decides whether a caller may act on a user's points
pub trait Authorizer: Send + Sync {
    fn authorize(&self, caller: Option<&str>, user_id: &str) -> Access;
}

/// Authorizer that lets every request through
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _caller: Option<&str>, _user_id: &str) -> Access {
        Access::Granted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    InternalError,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::Unauthorized => 401,
            Status::Forbidden => 403,
            Status::NotFound => 404,
            Status::InternalError => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: Status,
    pub body: Value,
}

impl Response {
    fn message(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            body: Value::String(message.into()),
        }
    }

    fn payload<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(body) => Self {
                status: Status::Ok,
                body,
            },
            Err(err) => Self::message(Status::InternalError, err.to_string()),
        }
    }
}

/// JSON body shared by the points endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub payer: Option<String>,
    /// Accepts a JSON number or a numeric string
    #[serde(default, deserialize_with = "deserialize_points")]
    pub points: Option<i64>,
    #[serde(default)]
    pub transaction_date: Option<String>,
}

fn deserialize_points<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPoints {
        Number(i64),
        Text(String),
    }

    match Option::<RawPoints>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawPoints::Number(points)) => Ok(Some(points)),
        Some(RawPoints::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("points must be an integer, got {text:?}"))),
    }
}

/// Request handlers over a sharded ledger
pub struct PointsService<A: Authorizer, S: RecordStore = InMemoryStore> {
    ledger: ShardedLedger<S>,
    authorizer: A,
}

impl<A: Authorizer, S: RecordStore> PointsService<A, S> {
    pub fn new(ledger: ShardedLedger<S>, authorizer: A) -> Self {
        Self { ledger, authorizer }
    }

    pub fn ledger(&self) -> &ShardedLedger<S> {
        &self.ledger
    }

    /// Dispatch a request by path
    pub async fn route(&self, path: &str, caller: Option<&str>, body: &[u8]) -> Response {
        match path {
            "/add_points" => self.add_points(caller, body).await,
            "/deduct_points" => self.deduct_points(caller, body).await,
            "/points_balance" => self.points_balance(caller, body).await,
            _ => Response::message(Status::NotFound, format!("No route for {path}")),
        }
    }

    /// Earn points from a payer, or spend from that payer when points are negative
    pub async fn add_points(&self, caller: Option<&str>, body: &[u8]) -> Response {
        self.try_add_points(caller, body)
            .await
            .unwrap_or_else(|response| response)
    }

    /// Spend points across all payers, oldest first, returning the receipt
    pub async fn deduct_points(&self, caller: Option<&str>, body: &[u8]) -> Response {
        self.try_deduct_points(caller, body)
            .await
            .unwrap_or_else(|response| response)
    }

    /// Per-payer balances of a user
    pub async fn points_balance(&self, caller: Option<&str>, body: &[u8]) -> Response {
        self.try_points_balance(caller, body)
            .await
            .unwrap_or_else(|response| response)
    }

    async fn try_add_points(
        &self,
        caller: Option<&str>,
        body: &[u8],
    ) -> Result<Response, Response> {
        let request = parse_request(body)?;
        let user_id = required(request.user_id.as_deref(), "userId")?;
        self.authorize(caller, user_id)?;
        let payer = required(request.payer.as_deref(), "payer")?;
        let points = request.points.ok_or_else(|| missing("points"))?;

        if points < 0 {
            let amount = spend_amount(points)?;
            self.ledger
                .spend(user_id, Some(payer), amount)
                .await
                .map_err(|err| match err {
                    LedgerError::NoRecords => Response::message(
                        Status::NotFound,
                        "No transactions found for this payer",
                    ),
                    other => error_response(other),
                })?;
            info!(user_id, payer, amount, "payer-scoped spend applied");
            Ok(Response::message(
                Status::Ok,
                "Updated transactions successfully",
            ))
        } else {
            let date = required(request.transaction_date.as_deref(), "transactionDate")?;
            self.ledger
                .earn(user_id, payer, points, date)
                .await
                .map_err(error_response)?;
            info!(user_id, payer, points, "points added");
            Ok(Response::message(
                Status::Ok,
                "Points added to user successfully",
            ))
        }
    }

    async fn try_deduct_points(
        &self,
        caller: Option<&str>,
        body: &[u8],
    ) -> Result<Response, Response> {
        let request = parse_request(body)?;
        let user_id = required(request.user_id.as_deref(), "userId")?;
        self.authorize(caller, user_id)?;
        let points = request.points.ok_or_else(|| missing("points"))?;
        let amount = spend_amount(points)?;

        let receipt = self
            .ledger
            .spend(user_id, None, amount)
            .await
            .map_err(error_response)?;
        info!(user_id, amount, lines = receipt.len(), "points deducted");
        Ok(Response::payload(&receipt))
    }

    async fn try_points_balance(
        &self,
        caller: Option<&str>,
        body: &[u8],
    ) -> Result<Response, Response> {
        let request = parse_request(body)?;
        let user_id = required(request.user_id.as_deref(), "userId")?;
        self.authorize(caller, user_id)?;

        let balances = self
            .ledger
            .balances(user_id)
            .await
            .map_err(error_response)?;
        Ok(Response::payload(&balances))
    }

    fn authorize(&self, caller: Option<&str>, user_id: &str) -> Result<(), Response> {
        match self.authorizer.authorize(caller, user_id) {
            Access::Granted => Ok(()),
            Access::Unauthenticated => Err(Response::message(
                Status::Unauthorized,
                "Authentication is required",
            )),
            Access::Denied => {
                warn!(user_id, "access denied");
                Err(Response::message(Status::Forbidden, "Access denied"))
            }
        }
    }
}

fn parse_request(body: &[u8]) -> Result<PointsRequest, Response> {
    serde_json::from_slice(body)
        .map_err(|err| Response::message(Status::BadRequest, format!("Invalid request body: {err}")))
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, Response> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(missing(field)),
    }
}

fn missing(field: &str) -> Response {
    Response::message(Status::BadRequest, format!("{field} is required"))
}

/// Spend requests carry the amount with either sign
fn spend_amount(points: i64) -> Result<i64, Response> {
    match points.checked_abs() {
        Some(0) => Err(Response::message(
            Status::BadRequest,
            "points must be non-zero",
        )),
        Some(amount) => Ok(amount),
        None => Err(Response::message(
            Status::BadRequest,
            "points out of range",
        )),
    }
}

fn error_response(err: LedgerError) -> Response {
    let status = match &err {
        LedgerError::NoRecords => Status::NotFound,
        LedgerError::InvalidAmount(_) => Status::BadRequest,
        LedgerError::InsufficientPoints { .. }
        | LedgerError::BalanceOverflow { .. }
        | LedgerError::Store(_) => Status::InternalError,
    };
    warn!(error = %err, status = status.code(), "points request failed");
    Response::message(status, err.to_string())
}
