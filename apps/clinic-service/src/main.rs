//! # Clinic Service サーバー
//!
//! クリニック向けの予約管理とドクタープロフィール編集を担当する内部 API
//! サーバー。
//!
//! ## 役割
//!
//! - **予約ワークフロー**: 予約内容の編集・支払い記録・ステータス変更・削除を
//!   1 トランザクションで確定する
//! - **予約照会**: クリニック単位の一覧・件数サマリの提供
//! - **プロフィール編集**: ドクターの基本情報・メールアドレス・パスワード・
//!   写真の変更
//!
//! ## アクセス制御
//!
//! Clinic Service は内部ネットワークからのみアクセス可能とする。
//! セッション認証は上流の認証ゲートウェイが担当し、解決済みの
//! クリニック ID / ユーザー ID を内部 API パラメータとして受け取る。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `CLINIC_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `CLINIC_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `S3_ENDPOINT_URL` | No | オブジェクトストレージの接続先（MinIO 使用時） |
//! | `S3_BUCKET_NAME` | No | 写真保存先バケット（デフォルト: `mediflow-photos`） |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境
//! cargo run -p mediflow-clinic-service
//!
//! # 本番環境
//! CLINIC_PORT=13001 DATABASE_URL=postgres://... cargo run -p mediflow-clinic-service --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post, put},
};
use mediflow_clinic_service::{
    config::ClinicConfig,
    handler::{
        ProfileState,
        ReservationState,
        count_reservations,
        delete_reservation,
        get_profile,
        get_reservation,
        health_check,
        list_doctors,
        list_payment_reservations,
        list_reservations,
        record_payment,
        update_email,
        update_password,
        update_profile,
        update_reservation,
        update_reservation_with_patient,
        update_status,
        upload_profile_photo,
        upload_reservation_photo,
    },
    usecase::{ProfileUseCaseImpl, ReservationUseCaseImpl},
};
use mediflow_domain::clock::{Clock, SystemClock};
use mediflow_infra::{
    Argon2PasswordChecker,
    PasswordChecker,
    db::{self, PgTransactionManager, TransactionManager},
    media::{self, MediaStorage, S3MediaStorage},
    repository::{
        DoctorRepository,
        PostgresDoctorRepository,
        PostgresReservationRepository,
        PostgresUserRepository,
        ReservationRepository,
        UserRepository,
    },
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Clinic Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mediflow=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 設定読み込み
    let config = ClinicConfig::from_env().expect("設定の読み込みに失敗しました");

    tracing::info!(
        "Clinic Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // データベース接続プールを作成
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("データベース接続に失敗しました");
    tracing::info!("データベースに接続しました");

    // マイグレーション実行
    db::run_migrations(&pool)
        .await
        .expect("マイグレーションの実行に失敗しました");
    tracing::info!("マイグレーションを適用しました");

    // オブジェクトストレージクライアントを作成
    let s3_client = media::create_client(config.s3_endpoint_url.as_deref()).await;
    let media_storage: Arc<dyn MediaStorage> = Arc::new(S3MediaStorage::new(
        s3_client,
        config.s3_bucket_name.clone(),
    ));

    // 依存コンポーネントを初期化
    let reservation_repo: Arc<dyn ReservationRepository> =
        Arc::new(PostgresReservationRepository::new(pool.clone()));
    let doctor_repo: Arc<dyn DoctorRepository> =
        Arc::new(PostgresDoctorRepository::new(pool.clone()));
    let user_repo: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(pool.clone()));
    let password_checker: Arc<dyn PasswordChecker> = Arc::new(Argon2PasswordChecker::new());
    let tx_manager: Arc<dyn TransactionManager> = Arc::new(PgTransactionManager::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let reservation_state = Arc::new(ReservationState {
        usecase: ReservationUseCaseImpl::new(
            reservation_repo,
            doctor_repo.clone(),
            media_storage.clone(),
            tx_manager.clone(),
            clock.clone(),
        ),
    });
    let profile_state = Arc::new(ProfileState {
        usecase: ProfileUseCaseImpl::new(
            doctor_repo,
            user_repo,
            media_storage,
            password_checker,
            tx_manager,
            clock,
        ),
    });

    // ルーター構築
    let app = Router::new()
        .route("/health", get(health_check))
        // 予約 API
        .merge(
            Router::new()
                .route("/clinic/reservations", get(list_reservations))
                .route("/clinic/reservations/count", get(count_reservations))
                .route(
                    "/clinic/reservations/payments",
                    get(list_payment_reservations),
                )
                .route("/clinic/reservations/photos", post(upload_reservation_photo))
                .route(
                    "/clinic/reservations/{id}",
                    get(get_reservation)
                        .put(update_reservation)
                        .delete(delete_reservation),
                )
                .route(
                    "/clinic/reservations/{id}/patient",
                    put(update_reservation_with_patient),
                )
                .route("/clinic/reservations/{id}/payment", post(record_payment))
                .route("/clinic/reservations/{id}/status", put(update_status))
                .route("/clinic/doctors", get(list_doctors))
                .with_state(reservation_state),
        )
        // プロフィール API
        .merge(
            Router::new()
                .route("/doctor/profile", get(get_profile).put(update_profile))
                .route("/doctor/profile/email", put(update_email))
                .route("/doctor/profile/password", put(update_password))
                .route("/doctor/profile/photo", post(upload_profile_photo))
                .with_state(profile_state),
        )
        .layer(TraceLayer::new_for_http());

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("アドレスのパースに失敗しました");

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Clinic Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
