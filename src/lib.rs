pub mod addr;
pub mod helpers;

#[cfg(test)]
pub mod test_utils;
