use std::io;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use log::{error, info};

use bookshelf::auth::AuthMiddleware;
use bookshelf::config::Config;
use bookshelf::db;
use bookshelf::repositories::{PgAuthorRepository, PgBookRepository, PgUserRepository};
use bookshelf::routes;

fn startup_error(err: bookshelf::AppError) -> io::Error {
    error!("Startup failed: {}", err);
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error)?;
    let pool = db::connect(&config.database).await.map_err(startup_error)?;
    db::run_migrations(&pool).await.map_err(startup_error)?;

    let authors = web::Data::new(PgAuthorRepository::new(pool.clone()));
    let books = web::Data::new(PgBookRepository::new(pool.clone()));
    let users = web::Data::new(PgUserRepository::new(pool.clone()));
    let auth = web::Data::new(config.auth.clone());

    info!("Starting bookshelf server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(authors.clone())
            .app_data(books.clone())
            .app_data(users.clone())
            .app_data(auth.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config::<PgAuthorRepository, PgBookRepository, PgUserRepository>),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await?;

    pool.close().await;
    info!("Server stopped, database pool closed");
    Ok(())
}
