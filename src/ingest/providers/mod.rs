pub mod bmkg;
