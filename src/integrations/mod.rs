pub mod github;
pub mod unsplash;
pub mod vercel;
