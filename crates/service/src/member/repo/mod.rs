pub mod seaorm;

pub use seaorm::SeaOrmMemberRepository;
