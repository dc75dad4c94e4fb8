mod isolation;
mod redundancy;
mod scheduling;
