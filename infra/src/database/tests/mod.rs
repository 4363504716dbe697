mod connection_tests;
