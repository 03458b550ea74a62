mod patterns;
mod quad_store;
