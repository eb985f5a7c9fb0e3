// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in command handlers driven against a mock transport.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use nexos_commands::builtin;
use nexos_commands::builtin::ImageCommand;
use nexos_commands::{CommandContext, CommandHandler, CommandRegistry};
use nexos_config::NexosConfig;
use nexos_core::OutboundContent;
use nexos_core::types::InboundMessage;
use nexos_test_utils::MockTransport;
use nexos_test_utils::builders::{MessageBuilder, group_text, private_text};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn registry() -> CommandRegistry {
    CommandRegistry::load(builtin::all(&NexosConfig::default()).unwrap())
}

fn context(transport: &Arc<MockTransport>, message: InboundMessage, args: &[&str]) -> CommandContext {
    CommandContext {
        transport: transport.clone(),
        chat_id: message.chat_id().to_string(),
        sender_id: message.sender_id(),
        is_group: message.is_group(),
        args: args.iter().map(|a| a.to_string()).collect(),
        message,
    }
}

async fn run(token: &str, message: InboundMessage, args: &[&str]) -> Arc<MockTransport> {
    let transport = Arc::new(MockTransport::new());
    let definition = registry().resolve(token).expect("command registered");
    definition
        .handler
        .run(context(&transport, message, args))
        .await
        .expect("handler succeeds");
    transport
}

#[tokio::test]
async fn replies_quote_the_command_message() {
    let message = private_text("967700@s.whatsapp.net", "مرحبا");
    let transport = run("مرحبا", message.clone(), &[]).await;
    let sent = transport.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, "967700@s.whatsapp.net");
    assert_eq!(sent[0].options.quoted.as_ref(), Some(&message));
    assert!(sent[0].text().unwrap().contains("بسام حميد"));
}

#[tokio::test]
async fn help_lists_commands() {
    let transport = run("HELP", private_text("1@s.whatsapp.net", "help"), &[]).await;
    let texts = transport.sent_texts().await;
    assert!(texts[0].starts_with("🤖 *قائمة الأوامر*"));
}

#[tokio::test]
async fn ping_reports_latency() {
    let message = MessageBuilder::new("1@s.whatsapp.net")
        .text("اختبار")
        .timestamp(chrono::Utc::now().timestamp() + 3600)
        .build();
    let transport = run("اختبار", message, &[]).await;
    assert_eq!(
        transport.sent_texts().await,
        vec!["🏓 اختبار الاستجابة: ~0 ملّي ثانية"]
    );
}

#[tokio::test]
async fn id_reports_group_sender() {
    let message = group_text("120363@g.us", "967700:12@s.whatsapp.net", "id");
    let transport = run("id", message, &[]).await;
    assert_eq!(
        transport.sent_texts().await,
        vec!["🆔 المحادثة: 120363@g.us\n👤 المرسل: 967700\n👥 مجموعة: نعم"]
    );
}

#[tokio::test]
async fn echo_repeats_arguments() {
    let transport = run("!echo", private_text("1@s.whatsapp.net", "!echo hi there"), &["hi", "there"]).await;
    assert_eq!(transport.sent_texts().await, vec!["hi there"]);
}

#[tokio::test]
async fn poll_sends_two_options() {
    let args = ["Best", "color", "|", "Red,", "Blue"];
    let transport = run(
        "!poll",
        private_text("1@s.whatsapp.net", "!poll Best color | Red, Blue"),
        &args,
    )
    .await;
    let sent = transport.sent_messages().await;
    assert_eq!(
        sent[0].content,
        OutboundContent::Poll {
            name: "Best color".into(),
            options: vec!["Red".into(), "Blue".into()],
            selectable_count: 1,
        }
    );
}

#[tokio::test]
async fn poll_with_one_option_asks_for_more() {
    let transport = run("poll", private_text("1@s.whatsapp.net", "poll Q | A"), &["Q", "|", "A"]).await;
    assert_eq!(
        transport.sent_texts().await,
        vec![builtin::poll::TOO_FEW_OPTIONS]
    );
}

#[tokio::test]
async fn image_without_url_shows_usage() {
    let transport = run("!صورة", private_text("1@s.whatsapp.net", "!صورة"), &[]).await;
    assert_eq!(transport.sent_texts().await, vec![builtin::image::USAGE]);
}

#[tokio::test]
async fn image_rejects_non_http_urls() {
    let transport = run("img", private_text("1@s.whatsapp.net", "img ftp://x"), &["ftp://x"]).await;
    assert_eq!(transport.sent_texts().await, vec![builtin::image::USAGE]);
}

#[tokio::test]
async fn unreachable_image_gets_apology() {
    let transport = run(
        "image",
        private_text("1@s.whatsapp.net", "image <http://127.0.0.1:1/a.png>"),
        &["<http://127.0.0.1:1/a.png>"],
    )
    .await;
    assert_eq!(
        transport.sent_texts().await,
        vec![builtin::image::FETCH_FAILED]
    );
}

#[tokio::test]
async fn failed_send_surfaces_as_error() {
    let transport = Arc::new(MockTransport::new());
    transport.fail_sends(true);
    let definition = registry().resolve("مساعدة").unwrap();
    let result = definition
        .handler
        .run(context(&transport, private_text("1@s.whatsapp.net", "مساعدة"), &[]))
        .await;
    assert!(result.is_err());
}

// ---- !صورة against a local HTTP server ----

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([30, 60, 200, 255]));
    let mut png = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut png, image::ImageFormat::Png)
        .unwrap();
    png.into_inner()
}

async fn serve_png(server: &MockServer, status: u16, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path("/cat.png"))
        .respond_with(
            ResponseTemplate::new(status)
                .insert_header("content-type", "image/png")
                .set_body_bytes(body),
        )
        .mount(server)
        .await;
}

async fn fetch_image(command: &ImageCommand, transport: &Arc<MockTransport>, url: &str) {
    let message = private_text("1@s.whatsapp.net", &format!("!صورة {url}"));
    command
        .run(context(transport, message, &[url]))
        .await
        .expect("handler succeeds");
}

fn image_command(max_bytes: u64) -> ImageCommand {
    ImageCommand::new(max_bytes, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn image_is_downloaded_transcoded_and_sent() {
    let server = MockServer::start().await;
    serve_png(&server, 200, png_bytes()).await;
    let transport = Arc::new(MockTransport::new());

    let url = format!("<{}/cat.png>", server.uri());
    fetch_image(&image_command(1024 * 1024), &transport, &url).await;

    let sent = transport.sent_messages().await;
    assert_eq!(sent.len(), 1);
    match &sent[0].content {
        OutboundContent::Image { bytes, caption } => {
            assert_eq!(&bytes[..2], &[0xFF, 0xD8], "expected a JPEG");
            assert_eq!(caption.as_deref(), Some(builtin::image::CAPTION));
        }
        other => panic!("expected an image, got {other:?}"),
    }
    assert!(sent[0].options.quoted.is_some());
}

#[tokio::test]
async fn error_status_gets_apology() {
    let server = MockServer::start().await;
    serve_png(&server, 404, b"not found".to_vec()).await;
    let transport = Arc::new(MockTransport::new());

    fetch_image(&image_command(1024 * 1024), &transport, &format!("{}/cat.png", server.uri())).await;

    assert_eq!(
        transport.sent_texts().await,
        vec![builtin::image::FETCH_FAILED]
    );
    assert_eq!(transport.sent_count().await, 1);
}

#[tokio::test]
async fn declared_length_over_cap_is_refused() {
    let server = MockServer::start().await;
    serve_png(&server, 200, vec![0u8; 4096]).await;
    let transport = Arc::new(MockTransport::new());

    fetch_image(&image_command(1024), &transport, &format!("{}/cat.png", server.uri())).await;

    assert_eq!(
        transport.sent_texts().await,
        vec![builtin::image::FETCH_FAILED]
    );
    assert_eq!(transport.sent_count().await, 1);
}

/// Serves one chunked response with no `Content-Length`, in 64-byte chunks.
async fn serve_chunked(total: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;

        let mut response =
            b"HTTP/1.1 200 OK\r\ncontent-type: image/png\r\ntransfer-encoding: chunked\r\n\r\n".to_vec();
        for _ in 0..total / 64 {
            response.extend_from_slice(b"40\r\n");
            response.extend_from_slice(&[0u8; 64]);
            response.extend_from_slice(b"\r\n");
        }
        response.extend_from_slice(b"0\r\n\r\n");
        let _ = socket.write_all(&response).await;
        let _ = socket.shutdown().await;
    });
    format!("http://{addr}/cat.png")
}

#[tokio::test]
async fn streamed_body_over_cap_is_refused() {
    let url = serve_chunked(4096).await;
    let transport = Arc::new(MockTransport::new());

    fetch_image(&image_command(1024), &transport, &url).await;

    assert_eq!(
        transport.sent_texts().await,
        vec![builtin::image::FETCH_FAILED]
    );
    assert_eq!(transport.sent_count().await, 1);
}

#[tokio::test]
async fn rejected_image_send_gets_apology() {
    let server = MockServer::start().await;
    serve_png(&server, 200, png_bytes()).await;
    let transport = Arc::new(MockTransport::new());
    transport.fail_images(true);

    fetch_image(&image_command(1024 * 1024), &transport, &format!("{}/cat.png", server.uri())).await;

    assert_eq!(
        transport.sent_texts().await,
        vec![builtin::image::FETCH_FAILED]
    );
}
