mod fixtures;

mod carpark_tests;
