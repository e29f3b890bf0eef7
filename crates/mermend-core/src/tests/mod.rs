mod er;
mod normalize;
