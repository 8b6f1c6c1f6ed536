/*
 * Responsibility
 * - handler が受け取る extractor の公開口
 */
mod user;

pub use user::User;
