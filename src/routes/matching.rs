use crate::core::{compatibility_score, shared_question_count, validate_answer};
use crate::models::{
    Answer, AnswerMap, CompatibilityRequest, CompatibilityResponse, DiscoveryRequest,
    DiscoveryResponse, ErrorResponse, HealthResponse, LikeRequest, LikeResponse, MatchEntry,
    MatchListResponse, Question, RankedCandidate, SubmitAnswerRequest, SubmitAnswerResponse,
};
use crate::routes::AppState;
use crate::services::CacheKey;
use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

/// Configure matching-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/discovery/batch", web::post().to(discovery_batch))
        .route("/likes", web::post().to(record_like))
        .route("/matches", web::get().to(list_matches))
        .route("/compatibility", web::post().to(compatibility))
        .route("/answers", web::post().to(submit_answer));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Fetch a user's answer sheet through the cache
async fn cached_answers(state: &AppState, user_id: &str) -> Result<AnswerMap, HttpResponse> {
    let key = CacheKey::answers(user_id);
    match state.cache.get::<AnswerMap>(&key).await {
        Ok(Some(answers)) => return Ok(answers),
        Ok(None) => {}
        Err(e) => tracing::warn!("Cache read failed for {}: {}", key, e),
    }

    let answers = match state.backend.get_answers(user_id).await {
        Ok(answers) => answers,
        Err(e) => {
            tracing::error!("Failed to fetch answers for {}: {}", user_id, e);
            return Err(HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch answers".to_string(),
                message: e.to_string(),
                status_code: 500,
            }));
        }
    };

    if let Err(e) = state.cache.set(&key, &answers).await {
        tracing::warn!("Cache write failed for {}: {}", key, e);
    }

    Ok(answers)
}

/// Discovery batch endpoint
///
/// POST /api/v1/discovery/batch
///
/// Request body:
/// ```json
/// {
///   "viewerId": "string",
///   "limit": 20,
///   "excludeUserIds": ["string"]
/// }
/// ```
async fn discovery_batch(
    state: web::Data<AppState>,
    req: web::Json<DiscoveryRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let viewer_id = &req.viewer_id;
    // Cap limit at 100 to prevent excessive queries
    let limit = req.limit.min(100) as usize;

    tracing::info!("Building discovery batch for {}, limit {}", viewer_id, limit);

    // The exclusion set comes from the live ledger on every call, so a
    // refresh never re-shows someone liked concurrently. A ledger failure
    // fails the request rather than leaking excluded candidates.
    let liked_ids = match state.postgres.liked_ids(viewer_id).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!("Failed to fetch liked ids for {}: {}", viewer_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to compute exclusion set".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let mut backend_excludes = liked_ids.clone();
    backend_excludes.push(viewer_id.clone());
    backend_excludes.extend(req.exclude_user_ids.iter().cloned());

    // Overfetch so post-filtering still fills the batch
    let candidates = match state
        .backend
        .list_active_profiles(&backend_excludes, limit * 5)
        .await
    {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Failed to list profiles for {}: {}", viewer_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to list candidate profiles".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let batch = state
        .queue
        .next_batch(viewer_id, candidates, &liked_ids, &req.exclude_user_ids, limit);

    // Score annotation is display-only; an unavailable sheet degrades to 0
    // and never removes a candidate from the batch
    let viewer_answers = match cached_answers(&state, viewer_id).await {
        Ok(answers) => answers,
        Err(_) => {
            tracing::warn!("Viewer sheet unavailable for {}, annotating 0", viewer_id);
            AnswerMap::new()
        }
    };

    let mut ranked = Vec::with_capacity(batch.len());
    for profile in batch {
        let score = match cached_answers(&state, &profile.user_id).await {
            Ok(candidate_answers) => compatibility_score(&viewer_answers, &candidate_answers),
            Err(_) => {
                tracing::warn!("Scoring {} failed, annotating 0", profile.user_id);
                0
            }
        };

        ranked.push(RankedCandidate {
            user_id: profile.user_id,
            display_name: profile.display_name,
            compatibility: score,
            about: profile.about,
        });
    }

    tracing::info!(
        "Returning {} candidates for {} ({} excluded via ledger)",
        ranked.len(),
        viewer_id,
        liked_ids.len()
    );

    let exhausted = ranked.is_empty();
    HttpResponse::Ok().json(DiscoveryResponse {
        candidates: ranked,
        exhausted,
    })
}

/// Like endpoint
///
/// POST /api/v1/likes
///
/// Records the directed like idempotently and reports whether this call
/// confirmed a mutual match.
async fn record_like(state: web::Data<AppState>, req: web::Json<LikeRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    if req.liker_id == req.liked_id {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: "A user cannot like themselves".to_string(),
            status_code: 400,
        });
    }

    let recorded = match state.postgres.record_like(&req.liker_id, &req.liked_id).await {
        Ok(inserted) => inserted,
        Err(e) => {
            tracing::error!("Failed to record like {} -> {}: {}", req.liker_id, req.liked_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to record like".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let reciprocal = match state.postgres.has_like(&req.liked_id, &req.liker_id).await {
        Ok(present) => present,
        Err(e) => {
            tracing::error!("Failed reciprocity check for {}: {}", req.liker_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to check reciprocity".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let mut matched = false;
    if reciprocal {
        match state
            .postgres
            .create_match_if_absent(&req.liker_id, &req.liked_id)
            .await
        {
            Ok(Some(confirmed)) => {
                matched = true;
                tracing::info!(
                    "Mutual match confirmed: {} <-> {}",
                    confirmed.user_lo,
                    confirmed.user_hi
                );
                // Best-effort; a notification failure never rolls back the match
                state.notifier.match_created(&confirmed);
            }
            Ok(None) => {
                // Match already existed from the concurrent/earlier call
                matched = true;
            }
            Err(e) => {
                tracing::error!("Failed to create match for {}: {}", req.liker_id, e);
                return HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Failed to create match".to_string(),
                    message: e.to_string(),
                    status_code: 500,
                });
            }
        }
    }

    HttpResponse::Ok().json(LikeResponse {
        recorded,
        matched,
        partner_id: matched.then(|| req.liked_id.clone()),
    })
}

/// Match list endpoint
///
/// GET /api/v1/matches?userId={userId}
async fn list_matches(
    state: web::Data<AppState>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let user_id = match query.get("userId") {
        Some(id) => id,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Missing userId parameter".to_string(),
                message: "userId query parameter is required".to_string(),
                status_code: 400,
            });
        }
    };

    match state.postgres.list_matches(user_id).await {
        Ok(found) => {
            let matches = found
                .iter()
                .map(|m| MatchEntry {
                    partner_id: m.partner_of(user_id).to_string(),
                    matched_at: m.created_at,
                })
                .collect();

            HttpResponse::Ok().json(MatchListResponse {
                user_id: user_id.clone(),
                matches,
            })
        }
        Err(e) => {
            tracing::error!("Failed to list matches for {}: {}", user_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to list matches".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Compatibility endpoint
///
/// POST /api/v1/compatibility
///
/// Scores an explicit pair from their current answer sheets.
async fn compatibility(
    state: web::Data<AppState>,
    req: web::Json<CompatibilityRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let score_key = CacheKey::score(&req.user_id, &req.target_user_id);
    if let Ok(Some(response)) = state.cache.get::<CompatibilityResponse>(&score_key).await {
        return HttpResponse::Ok().json(response);
    }

    let answers_a = match cached_answers(&state, &req.user_id).await {
        Ok(answers) => answers,
        Err(response) => return response,
    };
    let answers_b = match cached_answers(&state, &req.target_user_id).await {
        Ok(answers) => answers,
        Err(response) => return response,
    };

    let response = CompatibilityResponse {
        score: compatibility_score(&answers_a, &answers_b),
        shared_questions: shared_question_count(&answers_a, &answers_b),
    };

    if let Err(e) = state.cache.set(&score_key, &response).await {
        tracing::warn!("Cache write failed for {}: {}", score_key, e);
    }

    HttpResponse::Ok().json(response)
}

/// Answer submission endpoint
///
/// POST /api/v1/answers
///
/// Validates against the questionnaire before anything is written, then
/// invalidates the cached sheet and every cached score involving the user.
async fn submit_answer(
    state: web::Data<AppState>,
    req: web::Json<SubmitAnswerRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let questions_key = CacheKey::questions();
    let questions = match state.cache.get::<Vec<Question>>(&questions_key).await {
        Ok(Some(questions)) => questions,
        _ => match state.backend.list_questions().await {
            Ok(questions) => {
                if let Err(e) = state.cache.set(&questions_key, &questions).await {
                    tracing::warn!("Cache write failed for {}: {}", questions_key, e);
                }
                questions
            }
            Err(e) => {
                tracing::error!("Failed to fetch questionnaire: {}", e);
                return HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Failed to fetch questionnaire".to_string(),
                    message: e.to_string(),
                    status_code: 500,
                });
            }
        },
    };

    let question = match questions.iter().find(|q| q.id == req.question_id) {
        Some(question) => question,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Validation failed".to_string(),
                message: format!("Unknown question {}", req.question_id),
                status_code: 400,
            });
        }
    };

    let answer = Answer {
        choice: req.choice_index,
        importance: req.importance.unwrap_or(question.base_weight),
    };

    if let Err(e) = validate_answer(question, &answer) {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: e.to_string(),
            status_code: 400,
        });
    }

    if let Err(e) = state
        .backend
        .set_answer(&req.user_id, &req.question_id, &answer)
        .await
    {
        tracing::error!("Failed to store answer for {}: {}", req.user_id, e);
        return HttpResponse::InternalServerError().json(ErrorResponse {
            error: "Failed to store answer".to_string(),
            message: e.to_string(),
            status_code: 500,
        });
    }

    // The sheet changed: drop it and every score derived from it
    if let Err(e) = state.cache.delete(&CacheKey::answers(&req.user_id)).await {
        tracing::warn!("Failed to invalidate answer cache: {}", e);
    }
    if let Err(e) = state
        .cache
        .invalidate_pattern(&CacheKey::score_pattern(&req.user_id))
        .await
    {
        tracing::warn!("Failed to invalidate score cache: {}", e);
    }

    HttpResponse::Ok().json(SubmitAnswerResponse { success: true })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_response() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
        };

        assert_eq!(response.status, "healthy");
    }
}
