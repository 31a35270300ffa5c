use mockito::{Matcher, Mock, Server, ServerGuard};
use recipe_keeper::images::ImageDiscovery;
use recipe_keeper::model::Recipe;

fn page_mock(server: &mut ServerGuard, path: &str, body: String) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(body)
        .create()
}

fn image_head_mock(server: &mut ServerGuard, path: &str, content_type: &str) -> Mock {
    server
        .mock("HEAD", path)
        .with_status(200)
        .with_header("content-type", content_type)
        .create()
}

fn embed_miss_mock(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/embed")
        .match_query(Matcher::Any)
        .with_status(404)
        .create()
}

#[tokio::test]
async fn test_twitter_image_only_page() {
    let mut server = Server::new_async().await;
    let _page = page_mock(
        &mut server,
        "/recipe",
        r#"<html><head><meta name="twitter:image" content="/dish.jpg"></head><body></body></html>"#
            .to_string(),
    );
    let _head = image_head_mock(&mut server, "/dish.jpg", "image/jpeg");

    let discovery = ImageDiscovery::with_embed_base(server.url());
    let found = discovery
        .find_image(&format!("{}/recipe", server.url()))
        .await;

    // The relative content attribute comes back resolved to an absolute URL.
    assert_eq!(found.unwrap(), format!("{}/dish.jpg", server.url()));
}

#[tokio::test]
async fn test_og_image_wins_over_twitter_image() {
    let mut server = Server::new_async().await;
    let _page = page_mock(
        &mut server,
        "/recipe",
        r#"<html><head>
            <meta name="twitter:image" content="/tw.jpg">
            <meta property="og:image" content="/og.jpg">
        </head></html>"#
            .to_string(),
    );
    let _og = image_head_mock(&mut server, "/og.jpg", "image/jpeg");
    let _tw = image_head_mock(&mut server, "/tw.jpg", "image/jpeg");

    let discovery = ImageDiscovery::with_embed_base(server.url());
    let found = discovery
        .find_image(&format!("{}/recipe", server.url()))
        .await;

    assert_eq!(found.unwrap(), format!("{}/og.jpg", server.url()));
}

#[tokio::test]
async fn test_invalid_candidate_falls_through_to_the_next_strategy() {
    let mut server = Server::new_async().await;
    let _page = page_mock(
        &mut server,
        "/recipe",
        r#"<html><head>
            <meta property="og:image" content="/broken.jpg">
            <meta name="twitter:image" content="/working.jpg">
        </head></html>"#
            .to_string(),
    );
    // og:image 404s; validation fails closed and the cascade moves on.
    let _broken = server.mock("HEAD", "/broken.jpg").with_status(404).create();
    let _working = image_head_mock(&mut server, "/working.jpg", "image/png");

    let discovery = ImageDiscovery::with_embed_base(server.url());
    let found = discovery
        .find_image(&format!("{}/recipe", server.url()))
        .await;

    assert_eq!(found.unwrap(), format!("{}/working.jpg", server.url()));
}

#[tokio::test]
async fn test_largest_declared_inline_image_is_picked() {
    let mut server = Server::new_async().await;
    let _page = page_mock(
        &mut server,
        "/recipe",
        r#"<html><body>
            <img src="/nav-logo.jpg" width="800" height="600">
            <img src="/thumb.jpg" width="120" height="90">
            <img src="/hero.jpg" width="640" height="480">
            <img src="/side.jpg" width="300" height="200">
        </body></html>"#
            .to_string(),
    );
    let _hero = image_head_mock(&mut server, "/hero.jpg", "image/jpeg");
    let _side = image_head_mock(&mut server, "/side.jpg", "image/jpeg");

    let discovery = ImageDiscovery::with_embed_base(server.url());
    let found = discovery
        .find_image(&format!("{}/recipe", server.url()))
        .await;

    assert_eq!(found.unwrap(), format!("{}/hero.jpg", server.url()));
}

#[tokio::test]
async fn test_json_ld_recipe_image() {
    let mut server = Server::new_async().await;
    let body = format!(
        r#"<html><head><script type="application/ld+json">
        {{"@type": "Recipe", "name": "Cake", "image": ["{0}/ld.jpg"]}}
        </script></head></html>"#,
        server.url()
    );
    let _page = page_mock(&mut server, "/recipe", body);
    let _head = image_head_mock(&mut server, "/ld.jpg", "image/jpeg");

    let discovery = ImageDiscovery::with_embed_base(server.url());
    let found = discovery
        .find_image(&format!("{}/recipe", server.url()))
        .await;

    assert_eq!(found.unwrap(), format!("{}/ld.jpg", server.url()));
}

#[tokio::test]
async fn test_redirects_are_resolved_before_storing() {
    let mut server = Server::new_async().await;
    let _page = page_mock(
        &mut server,
        "/recipe",
        r#"<html><head><meta property="og:image" content="/old.jpg"></head></html>"#.to_string(),
    );
    let target = format!("{}/new.jpg", server.url());
    let _old = server
        .mock("HEAD", "/old.jpg")
        .with_status(301)
        .with_header("location", &target)
        .create();
    let _new = image_head_mock(&mut server, "/new.jpg", "image/jpeg");

    let discovery = ImageDiscovery::with_embed_base(server.url());
    let found = discovery
        .find_image(&format!("{}/recipe", server.url()))
        .await;

    // The final, redirect-resolved URL is what gets stored.
    assert_eq!(found.unwrap(), target);
}

#[tokio::test]
async fn test_embed_service_thumbnail_as_last_resort() {
    let mut server = Server::new_async().await;
    let _page = page_mock(
        &mut server,
        "/recipe",
        "<html><body><p>No pictures here.</p></body></html>".to_string(),
    );
    let thumb = format!("{}/thumb.jpg", server.url());
    let _embed = server
        .mock("GET", "/embed")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"thumbnail_url": "{thumb}"}}"#))
        .create();
    let _head = image_head_mock(&mut server, "/thumb.jpg", "image/jpeg");

    let discovery = ImageDiscovery::with_embed_base(server.url());
    let found = discovery
        .find_image(&format!("{}/recipe", server.url()))
        .await;

    assert_eq!(found.unwrap(), thumb);
}

#[tokio::test]
async fn test_no_signal_at_all_yields_absent() {
    let mut server = Server::new_async().await;
    let _page = page_mock(
        &mut server,
        "/recipe",
        "<html><body><p>Plain text page.</p></body></html>".to_string(),
    );
    let _embed = embed_miss_mock(&mut server);

    let discovery = ImageDiscovery::with_embed_base(server.url());
    let found = discovery
        .find_image(&format!("{}/recipe", server.url()))
        .await;

    assert!(found.is_none());
}

#[tokio::test]
async fn test_invalid_input_makes_no_network_call() {
    // No server at all: a network call would hang or error the test.
    let discovery = ImageDiscovery::with_embed_base("http://127.0.0.1:1");
    assert!(discovery.find_image("not a url").await.is_none());
    assert!(discovery.find_image("ftp://example.com/x").await.is_none());
}

#[tokio::test]
async fn test_best_image_keeps_a_valid_model_provided_url() {
    let mut server = Server::new_async().await;
    let _head = image_head_mock(&mut server, "/provided.jpg", "image/jpeg");

    let mut recipe = Recipe {
        image_url: Some(format!("{}/provided.jpg", server.url())),
        ..Default::default()
    };
    let discovery = ImageDiscovery::with_embed_base(server.url());
    discovery
        .best_image(&format!("{}/recipe", server.url()), &mut recipe)
        .await;

    assert_eq!(
        recipe.image_url.unwrap(),
        format!("{}/provided.jpg", server.url())
    );
}

#[tokio::test]
async fn test_best_image_falls_back_to_favicon() {
    let mut server = Server::new_async().await;
    let _page = page_mock(
        &mut server,
        "/recipe",
        "<html><body>nothing</body></html>".to_string(),
    );
    let _embed = embed_miss_mock(&mut server);
    let _favicon = image_head_mock(&mut server, "/favicon.ico", "image/x-icon");

    let mut recipe = Recipe::default();
    let discovery = ImageDiscovery::with_embed_base(server.url());
    discovery
        .best_image(&format!("{}/recipe", server.url()), &mut recipe)
        .await;

    assert_eq!(
        recipe.image_url.unwrap(),
        format!("{}/favicon.ico", server.url())
    );
}

#[tokio::test]
async fn test_best_image_tries_a_distinct_source_url() {
    let mut server = Server::new_async().await;
    let _mirror = page_mock(
        &mut server,
        "/mirror",
        "<html><body>no images</body></html>".to_string(),
    );
    let _original = page_mock(
        &mut server,
        "/original",
        r#"<html><head><meta property="og:image" content="/dish.jpg"></head></html>"#.to_string(),
    );
    let _head = image_head_mock(&mut server, "/dish.jpg", "image/jpeg");
    let _embed = embed_miss_mock(&mut server);

    let mut recipe = Recipe {
        source_url: Some(format!("{}/original", server.url())),
        ..Default::default()
    };
    let discovery = ImageDiscovery::with_embed_base(server.url());
    discovery
        .best_image(&format!("{}/mirror", server.url()), &mut recipe)
        .await;

    assert_eq!(
        recipe.image_url.unwrap(),
        format!("{}/dish.jpg", server.url())
    );
}
