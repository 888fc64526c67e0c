pub mod seaorm;

pub use seaorm::SeaOrmLoginLogRepository;
