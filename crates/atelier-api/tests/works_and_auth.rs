mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn visibility_toggle_round_trips_and_hides_from_others() {
    let app = TestApp::new().await;
    let creator = app.signup("carmen", "creator").await;
    let client = app.signup("kenji", "client").await;
    let work_id = app.post_work(&creator, true).await;
    let toggle_uri = format!("/works/{work_id}/visibility");

    let (status, body) = app
        .call(Method::POST, &toggle_uri, Some(&creator.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_public"], false);

    let (status, _) = app
        .call(Method::GET, &format!("/works/{work_id}"), Some(&client.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, list) = app.call(Method::GET, "/works", Some(&client.token), None).await;
    assert!(list.as_array().unwrap().is_empty());

    let (status, _) = app
        .call(Method::POST, &toggle_uri, Some(&client.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app
        .call(Method::POST, &toggle_uri, Some(&creator.token), None)
        .await;
    assert_eq!(body["is_public"], true);
    assert_eq!(body["tags"], json!(["film", "portrait"]));
}

#[tokio::test]
async fn like_then_unlike_restores_the_count() {
    let app = TestApp::new().await;
    let creator = app.signup("carmen", "creator").await;
    let client = app.signup("kenji", "client").await;
    let work_id = app.post_work(&creator, true).await;
    let like_uri = format!("/works/{work_id}/like");

    let (_, before) = app
        .call(Method::GET, &format!("/works/{work_id}"), Some(&client.token), None)
        .await;
    assert_eq!(before["like_count"], 0);

    let (_, liked) = app.call(Method::POST, &like_uri, Some(&client.token), None).await;
    assert_eq!(liked, json!({ "liked": true, "like_count": 1 }));

    let (_, unliked) = app.call(Method::POST, &like_uri, Some(&client.token), None).await;
    assert_eq!(unliked, json!({ "liked": false, "like_count": 0 }));
}

#[tokio::test]
async fn private_works_cannot_be_liked_by_others() {
    let app = TestApp::new().await;
    let creator = app.signup("carmen", "creator").await;
    let client = app.signup("kenji", "client").await;
    let work_id = app.post_work(&creator, false).await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/works/{work_id}/like"),
            Some(&client.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "forbidden" }));

    let (_, own) = app
        .call(Method::GET, &format!("/works/{work_id}"), Some(&creator.token), None)
        .await;
    assert_eq!(own["like_count"], 0);
}

#[tokio::test]
async fn malformed_requests_get_a_json_error_body() {
    let app = TestApp::new().await;
    let client = app.signup("kenji", "client").await;

    let (status, body) = app
        .call(Method::GET, "/works/not-a-uuid", Some(&client.token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let broken = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();
    let (status, body) = app.send(broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = app
        .call(Method::GET, "/works?creator_id=nobody", Some(&client.token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn works_filter_by_tag_and_creator() {
    let app = TestApp::new().await;
    let creator = app.signup("carmen", "creator").await;
    let client = app.signup("kenji", "client").await;
    app.post_work(&creator, true).await;
    let private = app.post_work(&creator, false).await;

    let (_, by_tag) = app
        .call(Method::GET, "/works?tag=FILM", Some(&client.token), None)
        .await;
    assert_eq!(by_tag.as_array().unwrap().len(), 1);

    let (_, none) = app
        .call(Method::GET, "/works?tag=oil", Some(&client.token), None)
        .await;
    assert!(none.as_array().unwrap().is_empty());

    let (_, own) = app
        .call(
            Method::GET,
            &format!("/works?creator_id={}", creator.id),
            Some(&creator.token),
            None,
        )
        .await;
    let ids: Vec<&str> = own
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&private.as_str()));
}

#[tokio::test]
async fn clients_cannot_post_works() {
    let app = TestApp::new().await;
    let client = app.signup("kenji", "client").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/works",
            Some(&client.token),
            Some(json!({ "title": "Not mine to post" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn session_lifecycle() {
    let app = TestApp::new().await;

    let (status, _) = app.call(Method::GET, "/auth/session", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let creator = app.signup("carmen", "creator").await;
    let (status, body) = app
        .call(Method::GET, "/auth/session", Some(&creator.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["role"], "creator");
    assert_eq!(body["profile"]["display_name"], "carmen");

    // Same email, different case.
    let (status, _) = app
        .call(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({
                "email": "CARMEN@example.com",
                "password": "another password",
                "role": "client",
                "display_name": "Imposter",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "carmen@example.com", "password": "wrong password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login) = app
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "carmen@example.com", "password": "correct horse battery" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["role"], "creator");

    let (status, _) = app
        .call(Method::POST, "/auth/logout", Some(&creator.token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .call(Method::GET, "/auth/session", Some(&creator.token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The fresh login token is unaffected.
    let (status, _) = app
        .call(
            Method::GET,
            "/auth/session",
            Some(login["token"].as_str().unwrap()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn role_cannot_be_changed_through_profile_edit() {
    let app = TestApp::new().await;
    let creator = app.signup("carmen", "creator").await;

    let (status, body) = app
        .call(
            Method::PATCH,
            "/profiles/me",
            Some(&creator.token),
            Some(json!({ "role": "client" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("role"), "{body}");

    let (status, body) = app
        .call(
            Method::PATCH,
            "/profiles/me",
            Some(&creator.token),
            Some(json!({ "bio": "Film photographer", "area": "Osaka" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "creator");
    assert_eq!(body["bio"], "Film photographer");
}

#[tokio::test]
async fn images_upload_and_serve_publicly() {
    let app = TestApp::new().await;
    let creator = app.signup("carmen", "creator").await;

    let upload = |content_type: &str, bytes: &'static [u8]| {
        Request::builder()
            .method(Method::POST)
            .uri("/storage/images")
            .header(header::AUTHORIZATION, format!("Bearer {}", creator.token))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(bytes))
            .unwrap()
    };

    let (status, body) = app.send(upload("image/png", b"\x89PNG pretend")).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let path = body["path"].as_str().unwrap().to_string();
    assert!(path.ends_with(".png"));
    assert_eq!(
        body["public_url"],
        format!("http://cdn.test/storage/images/{path}")
    );

    let (status, _) = app.send(upload("text/plain", b"hello")).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let untyped = Request::builder()
        .method(Method::POST)
        .uri("/storage/images")
        .header(header::AUTHORIZATION, format!("Bearer {}", creator.token))
        .body(Body::from(&b"\x89PNG pretend"[..]))
        .unwrap();
    let (status, body) = app.send(untyped).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = app.send(upload("image/png", &[0u8; 2048])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].is_string(), "{body}");

    // Serving needs no token.
    let get = Request::builder()
        .uri(format!("/storage/images/{path}"))
        .body(Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), get)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

    // The stored image can be attached to a work.
    let (status, work) = app
        .call(
            Method::POST,
            "/works",
            Some(&creator.token),
            Some(json!({ "title": "Harbour", "image_path": path })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        work["image_url"],
        format!("http://cdn.test/storage/images/{path}")
    );
}
