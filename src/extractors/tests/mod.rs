mod cascade_tests;
