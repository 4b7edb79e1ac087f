use crate::core::{aggregate_status, tally};
use crate::models::{
    CastVoteRequest, ConsensusResponse, ErrorResponse, FamilyVote, ShareProfileRequest,
    SharedProfile, TallyView, VoteChoice,
};
use crate::routes::AppState;
use crate::services::StoreError;
use actix_web::{web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Configure family-consensus routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/family/share", web::post().to(share_profile))
        .route("/family/vote", web::post().to(cast_vote))
        .route("/family/{id}/view", web::post().to(record_view))
        .route("/family/{id}", web::get().to(get_consensus));
}

fn consensus_response(profile: &SharedProfile, votes: &[FamilyVote]) -> ConsensusResponse {
    let counts = tally(votes);
    ConsensusResponse {
        id: profile.id.to_string(),
        candidate_id: profile.candidate_id.clone(),
        status: profile.status,
        tally: TallyView {
            approve: counts.approve,
            decline: counts.decline,
            discuss: counts.discuss,
        },
        required_votes: profile.required_votes,
        view_count: profile.view_count,
    }
}

fn parse_profile_id(raw: &str) -> Result<Uuid, HttpResponse> {
    Uuid::parse_str(raw).map_err(|_| {
        HttpResponse::BadRequest().json(ErrorResponse {
            error: "Invalid shared profile id".to_string(),
            message: format!("{} is not a valid id", raw),
            status_code: 400,
        })
    })
}

/// Share endpoint
///
/// POST /api/v1/family/share
///
/// Creates a SharedProfile with its quorum threshold fixed at share time.
/// The threshold is independent of the member count; a quorum above it is
/// accepted and simply unreachable by ordinary means.
async fn share_profile(
    state: web::Data<AppState>,
    req: web::Json<ShareProfileRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let required_votes = req.required_votes.unwrap_or(state.default_required_votes);
    if required_votes == 0 {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: "requiredVotes must be at least 1".to_string(),
            status_code: 400,
        });
    }

    // The candidate must still exist on the platform
    if let Err(e) = state.backend.get_profile(&req.candidate_id).await {
        tracing::warn!("Share rejected, candidate {} unavailable: {}", req.candidate_id, e);
        return HttpResponse::NotFound().json(ErrorResponse {
            error: "Candidate not found".to_string(),
            message: e.to_string(),
            status_code: 404,
        });
    }

    match state
        .postgres
        .create_shared_profile(&req.sharer_id, &req.candidate_id, required_votes)
        .await
    {
        Ok(profile) => HttpResponse::Ok().json(consensus_response(&profile, &[])),
        Err(e) => {
            tracing::error!("Failed to share profile for {}: {}", req.sharer_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to share profile".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Vote endpoint
///
/// POST /api/v1/family/vote
///
/// Upserts the member's vote, then recomputes the status from the full
/// current vote set. The status write is guarded so a terminal status
/// reached concurrently is never overwritten.
async fn cast_vote(state: web::Data<AppState>, req: web::Json<CastVoteRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let vote = match req.vote.to_lowercase().as_str() {
        "approve" => VoteChoice::Approve,
        "decline" => VoteChoice::Decline,
        "discuss" => VoteChoice::Discuss,
        _ => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid vote".to_string(),
                message: "Vote must be one of: approve, decline, discuss".to_string(),
                status_code: 400,
            });
        }
    };

    let profile_id = match parse_profile_id(&req.shared_profile_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let mut profile = match state.postgres.get_shared_profile(profile_id).await {
        Ok(profile) => profile,
        Err(StoreError::NotFound(message)) => {
            // Stale share: nothing is written, the last computed status stands
            return HttpResponse::NotFound().json(ErrorResponse {
                error: "Shared profile not found".to_string(),
                message,
                status_code: 404,
            });
        }
        Err(e) => {
            tracing::error!("Failed to fetch shared profile {}: {}", profile_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch shared profile".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    // Only active members of the sharer's circle may vote
    let members = match state.backend.list_active_members(&profile.sharer_id).await {
        Ok(members) => members,
        Err(e) => {
            tracing::error!("Failed to fetch members for {}: {}", profile.sharer_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to verify membership".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    if !members.iter().any(|m| m.member_id == req.member_id) {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: format!(
                "{} is not an active member of {}'s family circle",
                req.member_id, profile.sharer_id
            ),
            status_code: 400,
        });
    }

    if let Err(e) = state
        .postgres
        .upsert_vote(profile_id, &req.member_id, vote.into(), req.comment.as_deref())
        .await
    {
        tracing::error!("Failed to record vote on {}: {}", profile_id, e);
        return HttpResponse::InternalServerError().json(ErrorResponse {
            error: "Failed to record vote".to_string(),
            message: e.to_string(),
            status_code: 500,
        });
    }

    // Recompute from the full vote set; never from a cached counter
    let votes = match state.postgres.list_votes(profile_id).await {
        Ok(votes) => votes,
        Err(e) => {
            tracing::error!("Failed to fetch votes for {}: {}", profile_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to aggregate votes".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let recomputed = aggregate_status(profile.status, &votes, profile.required_votes);
    if recomputed != profile.status {
        match state
            .postgres
            .update_status_if_open(profile_id, recomputed.into())
            .await
        {
            Ok(true) => {
                tracing::info!("Shared profile {} moved to {:?}", profile_id, recomputed);
                profile.status = recomputed;
            }
            Ok(false) => {
                // A terminal status landed concurrently; report what stuck
                match state.postgres.get_shared_profile(profile_id).await {
                    Ok(fresh) => profile.status = fresh.status,
                    Err(e) => {
                        tracing::warn!("Status re-read failed for {}: {}", profile_id, e)
                    }
                }
            }
            Err(e) => {
                tracing::error!("Failed to persist status for {}: {}", profile_id, e);
                return HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Failed to persist status".to_string(),
                    message: e.to_string(),
                    status_code: 500,
                });
            }
        }
    }

    // Best-effort; delivery failure never affects the vote or the status
    state.notifier.vote_cast(profile_id, &req.member_id, vote);

    HttpResponse::Ok().json(consensus_response(&profile, &votes))
}

/// View endpoint
///
/// POST /api/v1/family/{id}/view
///
/// Bumps the informational view counter. The counter never participates in
/// the status computation.
async fn record_view(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let profile_id = match parse_profile_id(&path) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.postgres.increment_view_count(profile_id).await {
        Ok(view_count) => HttpResponse::Ok().json(serde_json::json!({
            "id": profile_id,
            "viewCount": view_count,
        })),
        Err(StoreError::NotFound(message)) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Shared profile not found".to_string(),
            message,
            status_code: 404,
        }),
        Err(e) => {
            tracing::error!("Failed to record view on {}: {}", profile_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to record view".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Consensus detail endpoint
///
/// GET /api/v1/family/{id}
async fn get_consensus(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let profile_id = match parse_profile_id(&path) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let profile = match state.postgres.get_shared_profile(profile_id).await {
        Ok(profile) => profile,
        Err(StoreError::NotFound(message)) => {
            return HttpResponse::NotFound().json(ErrorResponse {
                error: "Shared profile not found".to_string(),
                message,
                status_code: 404,
            });
        }
        Err(e) => {
            tracing::error!("Failed to fetch shared profile {}: {}", profile_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch shared profile".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    match state.postgres.list_votes(profile_id).await {
        Ok(votes) => HttpResponse::Ok().json(consensus_response(&profile, &votes)),
        Err(e) => {
            tracing::error!("Failed to fetch votes for {}: {}", profile_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch votes".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}
