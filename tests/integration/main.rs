mod bankid;
